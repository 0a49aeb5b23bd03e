use nbody::{BodyId, Engine};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;
use wasm_bindings::{serialize_server_msg, ClientToServerMessage, ServerToClientMessage};

use crate::{lock, state::ServerState};

pub async fn handle_client_to_server_messages(
    msg: ClientToServerMessage,
    state: Arc<ServerState>,
    tx: UnboundedSender<Message>,
) {
    match msg {
        ClientToServerMessage::Subscribe => {
            lock!(state.connected_clients).push(tx);
        }
        ClientToServerMessage::Tick => {
            lock!(state.engine.1).tick();
        }
        ClientToServerMessage::CreateBody => {
            let id = lock!(state.engine.1).create_body();
            let msg = ServerToClientMessage::BodyCreated { id: id.value() };
            send_server_msg(msg, &tx);
        }
        ClientToServerMessage::DeleteBody(id) => {
            lock!(state.engine.1).delete_body(BodyId(id));
        }
        ClientToServerMessage::UpdateBody(id, updates) => {
            lock!(state.engine.1).update_body(BodyId(id), updates);
        }
        ClientToServerMessage::UpdateSimulation(updates) => {
            lock!(state.engine.1).update_simulation(updates);
        }
        ClientToServerMessage::Import(sim_base, bodies_base) => {
            lock!(state.engine.1).import(sim_base, &bodies_base);
        }
        ClientToServerMessage::State => {
            let state_msg = {
                let engine = lock!(state.engine.1);
                gather_state(&engine)
            };
            send_server_msg(state_msg, &tx);
        }
    }
}

fn send_server_msg(msg: ServerToClientMessage, tx: &UnboundedSender<Message>) {
    match serialize_server_msg(msg).map(|data| tx.send(Message::binary(data))) {
        Some(Ok(_)) => {}
        Some(Err(e)) => log::warn!("failed to send message: {:?}", e),
        None => log::warn!("failed to serialize message"),
    }
}

pub fn gather_state(engine: &Engine) -> ServerToClientMessage {
    let (sim, bodies) = engine.export();
    ServerToClientMessage::StateUpdate { sim, bodies }
}
