use nbody::Engine;
use std::sync::{atomic::AtomicUsize, Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio_tungstenite::tungstenite::Message;

pub struct ServerState {
    pub engine: (Arc<AtomicUsize>, Arc<Mutex<Engine>>),
    pub connected_clients: Arc<Mutex<Vec<UnboundedSender<Message>>>>,
}

impl ServerState {
    pub fn new() -> Self {
        let engine = Arc::new(Mutex::new(Engine::new()));
        let ticker = Arc::new(AtomicUsize::new(0));

        // spawn a new task to run the simulation
        spawn_simulation(Arc::clone(&ticker), Arc::clone(&engine));

        Self {
            engine: (ticker, engine),
            connected_clients: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

fn spawn_simulation(
    counter: Arc<AtomicUsize>,
    engine: Arc<Mutex<Engine>>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut last_update = std::time::Instant::now();
        let max_fps = std::time::Duration::from_secs_f64(1.0 / 60.0); // maximum front-end limit
        loop {
            if last_update.elapsed() > max_fps {
                let mut engine = engine.lock().unwrap_or_else(|p| p.into_inner());
                engine.tick();
                counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                last_update = std::time::Instant::now();
            }
        }
    })
}
