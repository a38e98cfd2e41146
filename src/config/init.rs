// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Creates a commented tagpull.yml template.

use std::path::Path;

use crate::error::{Error, Result};

use super::{CONFIG_FILENAME, DEFAULT_PROBE_IMAGE};
use crate::pull::DEFAULT_PIPE_CAPACITY;

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, generate_template_yaml())?;

    Ok(())
}

fn generate_template_yaml() -> String {
    format!(
        r#"# Engine connection. DOCKER_HOST, DOCKER_TLS_VERIFY and DOCKER_CERT_PATH
# override these; without a host the local socket is detected.
engine:
  # host: tcp://127.0.0.1:2376
  tls_verify: false
  # cert_path: ~/.docker

registry:
  timeout: 30s
  # auth:
  #   username: deploy
  #   password:
  #     env: REGISTRY_PASSWORD

bridge:
  probe_image: {}

pipe_capacity: {}
"#,
        DEFAULT_PROBE_IMAGE, DEFAULT_PIPE_CAPACITY
    )
}
