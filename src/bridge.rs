// ABOUTME: Bridge gateway discovery through a disposable probe container.
// ABOUTME: The probe is always removed; the first failure is the one reported.

use crate::progress::ProgressRenderer;
use crate::pull::{ImagePuller, PullError};
use crate::resolve::CandidateSource;
use crate::runtime::{ContainerConfig, ContainerError, ContainerOps, ImageError, ImageOps, RemoveOptions};
use crate::types::{ContainerId, ImageName};
use snafu::{OptionExt, ResultExt, Snafu};
use std::io::Write;
use tracing::{debug, info};

/// Keeps the probe alive until it is removed.
const PROBE_COMMAND: [&str; 3] = ["/bin/sh", "-c", "while true; do sleep 1; done"];

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum BridgeError {
    #[snafu(display("failed to inspect image {image}: {source}"))]
    InspectImage {
        image: ImageName,
        source: ImageError,
    },

    #[snafu(display("failed to pull probe image: {source}"))]
    PullProbe { source: PullError },

    #[snafu(display("failed to create probe container: {source}"))]
    Create { source: ContainerError },

    #[snafu(display("failed to start container {container}: {source}"))]
    Start {
        container: String,
        source: ContainerError,
    },

    #[snafu(display("failed to inspect container {container}: {source}"))]
    Inspect {
        container: String,
        source: ContainerError,
    },

    #[snafu(display("failed to remove container {container}: {source}"))]
    Remove {
        container: String,
        source: ContainerError,
    },

    #[snafu(display("container {container} reports no gateway address"))]
    NoGateway { container: String },
}

/// Finds the engine's bridge gateway address.
pub struct BridgeLocator<'a, E, L, R> {
    puller: &'a ImagePuller<E, L, R>,
    probe_image: ImageName,
}

impl<'a, E, L, R> BridgeLocator<'a, E, L, R>
where
    E: ImageOps + ContainerOps + 'static,
    L: CandidateSource,
    R: CandidateSource,
{
    pub fn new(puller: &'a ImagePuller<E, L, R>, probe_image: ImageName) -> Self {
        Self {
            puller,
            probe_image,
        }
    }

    pub fn probe_image(&self) -> &ImageName {
        &self.probe_image
    }

    pub async fn locate<W: Write>(
        &self,
        display: &mut ProgressRenderer<W>,
    ) -> Result<String, BridgeError> {
        self.ensure_probe_image(display).await?;

        let engine = self.puller.engine();
        let config = ContainerConfig {
            name: None,
            image: self.probe_image.clone(),
            command: PROBE_COMMAND.iter().map(ToString::to_string).collect(),
        };
        let id = engine.create_container(&config).await.context(CreateSnafu)?;
        debug!(container = %id.short(), "created probe container");

        let located = self.gateway_of(&id).await;
        let removed = engine
            .remove_container(
                &id,
                RemoveOptions {
                    force: true,
                    remove_volumes: true,
                },
            )
            .await
            .context(RemoveSnafu {
                container: id.short(),
            });

        let gateway = located?;
        removed?;

        info!(gateway = %gateway, "located bridge gateway");
        Ok(gateway)
    }

    async fn ensure_probe_image<W: Write>(
        &self,
        display: &mut ProgressRenderer<W>,
    ) -> Result<(), BridgeError> {
        let engine = self.puller.engine();
        let present = engine
            .image_exists(&self.probe_image)
            .await
            .context(InspectImageSnafu {
                image: self.probe_image.clone(),
            })?;

        if !present {
            info!(image = %self.probe_image, "pulling probe image");
            self.puller
                .pull(&self.probe_image, None, false, display)
                .await
                .context(PullProbeSnafu)?;
        }
        Ok(())
    }

    async fn gateway_of(&self, id: &ContainerId) -> Result<String, BridgeError> {
        let engine = self.puller.engine();
        engine
            .start_container(id)
            .await
            .context(StartSnafu { container: id.short() })?;

        let info = engine
            .inspect_container(id)
            .await
            .context(InspectSnafu { container: id.short() })?;

        info.network_settings
            .gateway()
            .map(str::to_string)
            .context(NoGatewaySnafu { container: id.short() })
    }
}
