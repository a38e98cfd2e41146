// ABOUTME: Resolve-then-pull with streamed progress.
// ABOUTME: A background worker writes engine progress into a pipe the foreground renders.

use crate::progress::{ProgressRenderer, RenderError};
use crate::resolve::{CandidateSource, ResolveError, TagResolver};
use crate::runtime::{ImageError, ImageOps, PullImageRequest, RegistryAuth};
use crate::types::ImageName;
use snafu::{ResultExt, Snafu};
use std::io::Write;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Bytes buffered between the pull worker and the renderer.
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PullError {
    #[snafu(display("{source}"))]
    Resolve { source: ResolveError },

    #[snafu(display("failed to read pull progress for {image}: {source}"))]
    Stream {
        image: ImageName,
        source: RenderError,
    },

    #[snafu(display("failed to pull image {image}: {source}"))]
    Pull {
        image: ImageName,
        source: ImageError,
    },

    #[snafu(display("pull worker for {image} exited without a result"))]
    WorkerLost { image: ImageName },
}

/// Pulls images by resolved tag while rendering progress.
pub struct ImagePuller<E, L, R> {
    engine: Arc<E>,
    resolver: TagResolver<L, R>,
    pipe_capacity: usize,
}

impl<E, L, R> ImagePuller<E, L, R>
where
    E: ImageOps + 'static,
    L: CandidateSource,
    R: CandidateSource,
{
    pub fn new(engine: Arc<E>, resolver: TagResolver<L, R>) -> Self {
        Self {
            engine,
            resolver,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Resolve `image`, pull the resolved tag, and return the concrete name.
    ///
    /// The engine call runs on its own task and closes the pipe when it
    /// returns, so rendering always ends at EOF. Its result is read once,
    /// after rendering finishes.
    pub async fn pull<W: Write>(
        &self,
        image: &ImageName,
        auth: Option<&RegistryAuth>,
        force: bool,
        display: &mut ProgressRenderer<W>,
    ) -> Result<ImageName, PullError> {
        debug!(image = %image, force, "resolving");
        let tag = self.resolver.resolve(image, force).await.context(ResolveSnafu)?;
        let resolved = image.with_tag(tag);

        debug!(image = %resolved, "streaming");
        let request = PullImageRequest::for_image(&resolved);
        let (mut writer, reader) = tokio::io::duplex(self.pipe_capacity);
        let (done_tx, done_rx) = oneshot::channel();
        let engine = Arc::clone(&self.engine);
        let auth = auth.cloned();

        tokio::spawn(async move {
            let result = engine
                .pull_image(&request, auth.as_ref(), &mut writer)
                .await;
            if let Err(e) = writer.shutdown().await {
                warn!(error = %e, "failed to close progress pipe");
            }
            drop(writer);
            // Receiver dropped when rendering failed first
            let _ = done_tx.send(result);
        });

        display.render_stream(reader).await.context(StreamSnafu {
            image: image.clone(),
        })?;

        match done_rx.await {
            Ok(result) => result.context(PullSnafu {
                image: image.clone(),
            })?,
            Err(_) => {
                return WorkerLostSnafu {
                    image: image.clone(),
                }
                .fail();
            }
        }

        debug!(image = %resolved, "done");
        Ok(resolved)
    }
}
