//! Client event loop: frame ticks, relay events, keys and asset loads

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::app::frame::FrameSink;
use crate::app::keys::KeySignal;
use crate::app::session::Session;
use crate::config::Config;
use crate::game::asset::{AssetError, AssetLoader, LoadedAsset};
use crate::game::registry::LoadRequest;
use crate::game::snapshot::SyncStats;
use crate::util::time::FrameClock;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// A finished asset load, routed back into the loop
enum LoadCompletion {
    Local(Result<LoadedAsset, AssetError>),
    Remote(LoadRequest, Result<LoadedAsset, AssetError>),
}

/// Owns the session and serializes every callback onto one task
pub struct ClientRunner<F> {
    session: Session<mpsc::UnboundedSender<ClientMsg>>,
    inbound: mpsc::UnboundedReceiver<ServerMsg>,
    keys: mpsc::UnboundedReceiver<KeySignal>,
    loads_tx: mpsc::UnboundedSender<LoadCompletion>,
    loads_rx: mpsc::UnboundedReceiver<LoadCompletion>,
    loader: Arc<dyn AssetLoader>,
    frames: F,
    tick_interval: Duration,
}

impl<F: FrameSink> ClientRunner<F> {
    pub fn new(
        config: &Config,
        outbound: mpsc::UnboundedSender<ClientMsg>,
        inbound: mpsc::UnboundedReceiver<ServerMsg>,
        keys: mpsc::UnboundedReceiver<KeySignal>,
        loader: Arc<dyn AssetLoader>,
        frames: F,
    ) -> Self {
        let (loads_tx, loads_rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(outbound, config),
            inbound,
            keys,
            loads_tx,
            loads_rx,
            loader,
            frames,
            tick_interval: config.tick_interval(),
        }
    }

    /// Run until `shutdown` resolves or the relay goes away
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> SyncStats {
        info!(interval_us = self.tick_interval.as_micros() as u64, "Client loop started");
        tokio::pin!(shutdown);

        self.spawn_load(None);

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = FrameClock::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, leaving client loop");
                    break;
                }
                _ = ticker.tick() => {
                    let dt = clock.delta();
                    self.session.tick(dt, &mut self.frames);
                }
                msg = self.inbound.recv() => match msg {
                    Some(msg) => {
                        let loads = self.session.handle_server_msg(msg);
                        for request in loads {
                            self.spawn_load(Some(request));
                        }
                    }
                    None => {
                        warn!("Relay connection lost");
                        break;
                    }
                },
                Some(signal) = self.keys.recv() => {
                    self.session.on_key(&signal.key, signal.pressed);
                }
                Some(done) = self.loads_rx.recv() => match done {
                    LoadCompletion::Local(result) => {
                        self.session.complete_local_load(result);
                    }
                    LoadCompletion::Remote(request, result) => {
                        self.session.complete_remote_load(request, result);
                    }
                },
            }
        }

        info!(frames = clock.frames(), "Client loop stopped");
        self.session.adapter().stats()
    }

    /// Start an asset load; `None` loads the local avatar
    fn spawn_load(&self, request: Option<LoadRequest>) {
        let load = self.loader.load();
        let tx = self.loads_tx.clone();

        tokio::spawn(async move {
            let result = load.await;
            let done = match request {
                Some(request) => LoadCompletion::Remote(request, result),
                None => LoadCompletion::Local(result),
            };
            if tx.send(done).is_err() {
                debug!("Client loop gone, dropping asset load result");
            }
        });
    }
}
