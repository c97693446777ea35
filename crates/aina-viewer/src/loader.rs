//! Background model decoding
//!
//! File I/O and glTF decoding run on a tokio blocking pool. The decoded
//! [`SceneAsset`] comes back through a channel that the render thread polls
//! once per frame; GPU uploads stay on the render thread.

use std::sync::mpsc;

use aina_assets::{load_scene, SceneAsset};
use tracing::debug;

use crate::error::ViewerError;
use crate::viewer::LoadRequest;

/// A non-blocking handle to a load in flight.
/// Call `try_recv()` each frame to check for the decoded scene.
pub struct PendingLoad {
    request: LoadRequest,
    receiver: mpsc::Receiver<Result<SceneAsset, ViewerError>>,
}

impl PendingLoad {
    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    /// Non-blocking check for the result. Returns `None` while decoding.
    pub fn try_recv(&self) -> Option<Result<SceneAsset, ViewerError>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => {
                Some(Err(ViewerError::Loader("loader task ended without a result".into())))
            }
        }
    }

    /// Blocking wait for the result.
    pub fn wait(self) -> (LoadRequest, Result<SceneAsset, ViewerError>) {
        let result = self
            .receiver
            .recv()
            .map_err(|_| ViewerError::Loader("Channel closed".into()))
            .and_then(|result| result);
        (self.request, result)
    }

    pub fn into_request(self) -> LoadRequest {
        self.request
    }
}

/// Owns a small background runtime for decoding models.
pub struct ModelLoader {
    runtime: tokio::runtime::Runtime,
}

impl ModelLoader {
    pub fn new() -> Result<Self, ViewerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("aina-loader")
            .enable_all()
            .build()
            .map_err(|e| ViewerError::Loader(format!("Failed to create runtime: {}", e)))?;
        Ok(Self { runtime })
    }

    /// Start decoding the requested model.
    pub fn load(&self, request: LoadRequest) -> PendingLoad {
        let (tx, rx) = mpsc::channel();
        let path = request.path.clone();
        debug!("Queued background load of {}", path.display());

        self.runtime.spawn(async move {
            let result = tokio::task::spawn_blocking(move || load_scene(&path))
                .await
                .map_err(|e| ViewerError::Loader(format!("decode task failed: {}", e)))
                .and_then(|decoded| decoded.map_err(ViewerError::from));
            let _ = tx.send(result);
        });

        PendingLoad {
            request,
            receiver: rx,
        }
    }
}
