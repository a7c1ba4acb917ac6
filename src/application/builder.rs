//! Scan job specification builder
//!
//! Synthesizes the pod specification of a batch job that runs the scanner
//! against every container image of a workload. The builder performs no I/O:
//! it only folds the plugin configuration and the workload spec into
//! Kubernetes objects, ready for submission by the orchestrator.
//!
//! The emitted environment variable names and scanner arguments are a fixed
//! contract with the Trivy binary and must not drift.

use k8s_openapi::api::core::v1::{
    Affinity, Capabilities, ConfigMapKeySelector, ConfigMapVolumeSource, Container,
    EmptyDirVolumeSource, EnvVar, EnvVarSource, KeyToPath, NodeAffinity, NodeSelector,
    NodeSelectorRequirement, NodeSelectorTerm, PodSecurityContext, PodSpec, Secret,
    SecretKeySelector, SecurityContext, Volume, VolumeMount,
};
use tracing::debug;

use super::errors::{Error, Result};
use super::{PluginContext, TrivyPlugin};
use crate::config::{self, TrivyMode};
use crate::domain::image::ImageReference;

const TRIVY_COMMAND: &str = "trivy";
const CACHE_DIR: &str = "/var/lib/trivy";
const CACHE_VOLUME_NAME: &str = "data";
const IGNORE_FILE_VOLUME_NAME: &str = "ignorefile";
const IGNORE_FILE_NAME: &str = ".trivyignore";
const IGNORE_FILE_MOUNT_PATH: &str = "/tmp/trivy/.trivyignore";

impl TrivyPlugin {
    /// Builds the scan job pod specification for `workload`.
    ///
    /// Produces exactly one scan container per workload container, preserving
    /// names and order, plus (in standalone mode) one init container that
    /// downloads the vulnerability database into a shared cache. The second
    /// element of the returned pair lists newly minted credential secrets;
    /// this plugin delegates credential minting to its collaborators and the
    /// list is always empty. A pre-existing credentials secret passed by the
    /// caller is wired into the scan containers by reference.
    pub fn get_scan_job_spec(
        &self,
        ctx: &PluginContext,
        workload: &PodSpec,
        credentials: Option<&Secret>,
    ) -> Result<(PodSpec, Vec<Secret>)> {
        if ctx.name.is_empty() || ctx.namespace.is_empty() {
            return Err(Error::Validation(
                "plugin context requires a non-empty name and namespace".to_string(),
            ));
        }
        if workload.containers.is_empty() {
            return Err(Error::Validation(
                "workload spec contains no containers".to_string(),
            ));
        }

        let mode = self.config.mode()?;
        let job_spec = match mode {
            TrivyMode::Standalone => self.standalone_job_spec(workload, credentials)?,
            TrivyMode::ClientServer => self.client_server_job_spec(workload, credentials)?,
        };
        debug!(
            plugin = %ctx.name,
            namespace = %ctx.namespace,
            %mode,
            containers = workload.containers.len(),
            "assembled scan job spec",
        );
        Ok((job_spec, Vec::new()))
    }

    fn standalone_job_spec(
        &self,
        workload: &PodSpec,
        credentials: Option<&Secret>,
    ) -> Result<PodSpec> {
        let trivy_image = self.config.trivy_image_ref()?.to_string();
        let requirements = self.config.resource_requirements()?;
        let ignore_file_configured = self.config.ignore_file().is_some();

        let init_container = Container {
            name: self.id_generator.generate().to_string(),
            image: Some(trivy_image.clone()),
            image_pull_policy: Some("IfNotPresent".to_string()),
            termination_message_policy: Some("FallbackToLogsOnError".to_string()),
            env: Some(vec![
                config_map_env("HTTP_PROXY", config::KEY_HTTP_PROXY),
                config_map_env("HTTPS_PROXY", config::KEY_HTTPS_PROXY),
                config_map_env("NO_PROXY", config::KEY_NO_PROXY),
                secret_env("GITHUB_TOKEN", config::KEY_GITHUB_TOKEN),
            ]),
            command: Some(vec![TRIVY_COMMAND.to_string()]),
            args: Some(vec![
                "--download-db-only".to_string(),
                "--cache-dir".to_string(),
                CACHE_DIR.to_string(),
            ]),
            resources: Some(requirements.clone()),
            volume_mounts: Some(vec![cache_volume_mount()]),
            // The init container fills the shared cache, so its root
            // filesystem stays writable.
            security_context: Some(hardened_security_context(false)),
            ..Container::default()
        };

        let mut volumes = vec![cache_volume()];
        if ignore_file_configured {
            volumes.push(ignore_file_volume());
        }

        let mut containers = Vec::with_capacity(workload.containers.len());
        for workload_container in &workload.containers {
            let image = workload_container.image.clone().unwrap_or_default();
            let mut env = vec![
                config_map_env("TRIVY_SEVERITY", config::KEY_SEVERITY),
                config_map_env("TRIVY_IGNORE_UNFIXED", config::KEY_IGNORE_UNFIXED),
                config_map_env("TRIVY_SKIP_FILES", config::KEY_SKIP_FILES),
                config_map_env("TRIVY_SKIP_DIRS", config::KEY_SKIP_DIRS),
                config_map_env("HTTP_PROXY", config::KEY_HTTP_PROXY),
                config_map_env("HTTPS_PROXY", config::KEY_HTTPS_PROXY),
                config_map_env("NO_PROXY", config::KEY_NO_PROXY),
            ];
            self.append_conditional_env(
                &mut env,
                &image,
                &workload_container.name,
                credentials,
            )?;

            let mut volume_mounts = vec![cache_volume_mount()];
            if ignore_file_configured {
                volume_mounts.push(ignore_file_volume_mount());
            }

            containers.push(Container {
                name: workload_container.name.clone(),
                image: Some(trivy_image.clone()),
                image_pull_policy: Some("IfNotPresent".to_string()),
                termination_message_policy: Some("FallbackToLogsOnError".to_string()),
                env: Some(env),
                command: Some(vec![TRIVY_COMMAND.to_string()]),
                args: Some(vec![
                    "--skip-update".to_string(),
                    "--cache-dir".to_string(),
                    CACHE_DIR.to_string(),
                    "--quiet".to_string(),
                    "--format".to_string(),
                    "json".to_string(),
                    image,
                ]),
                resources: Some(requirements.clone()),
                volume_mounts: Some(volume_mounts),
                security_context: Some(hardened_security_context(true)),
                ..Container::default()
            });
        }

        Ok(PodSpec {
            affinity: Some(linux_node_affinity()),
            restart_policy: Some("Never".to_string()),
            automount_service_account_token: Some(false),
            security_context: Some(PodSecurityContext::default()),
            volumes: Some(volumes),
            init_containers: Some(vec![init_container]),
            containers,
            ..PodSpec::default()
        })
    }

    fn client_server_job_spec(
        &self,
        workload: &PodSpec,
        credentials: Option<&Secret>,
    ) -> Result<PodSpec> {
        let trivy_image = self.config.trivy_image_ref()?.to_string();
        let server_url = self.config.server_url()?.to_string();
        let requirements = self.config.resource_requirements()?;
        let ignore_file_configured = self.config.ignore_file().is_some();

        let mut containers = Vec::with_capacity(workload.containers.len());
        for workload_container in &workload.containers {
            let image = workload_container.image.clone().unwrap_or_default();
            let mut env = vec![
                config_map_env("HTTP_PROXY", config::KEY_HTTP_PROXY),
                config_map_env("HTTPS_PROXY", config::KEY_HTTPS_PROXY),
                config_map_env("NO_PROXY", config::KEY_NO_PROXY),
                config_map_env("TRIVY_SEVERITY", config::KEY_SEVERITY),
                config_map_env("TRIVY_IGNORE_UNFIXED", config::KEY_IGNORE_UNFIXED),
                config_map_env("TRIVY_SKIP_FILES", config::KEY_SKIP_FILES),
                config_map_env("TRIVY_SKIP_DIRS", config::KEY_SKIP_DIRS),
                secret_env("TRIVY_TOKEN_HEADER", config::KEY_SERVER_TOKEN_HEADER),
                secret_env("TRIVY_TOKEN", config::KEY_SERVER_TOKEN),
                secret_env("TRIVY_CUSTOM_HEADERS", config::KEY_SERVER_CUSTOM_HEADERS),
            ];
            self.append_conditional_env(
                &mut env,
                &image,
                &workload_container.name,
                credentials,
            )?;

            let volume_mounts = ignore_file_configured.then(|| vec![ignore_file_volume_mount()]);

            containers.push(Container {
                name: workload_container.name.clone(),
                image: Some(trivy_image.clone()),
                image_pull_policy: Some("IfNotPresent".to_string()),
                termination_message_policy: Some("FallbackToLogsOnError".to_string()),
                env: Some(env),
                command: Some(vec![TRIVY_COMMAND.to_string()]),
                args: Some(vec![
                    "--quiet".to_string(),
                    "client".to_string(),
                    "--format".to_string(),
                    "json".to_string(),
                    "--remote".to_string(),
                    server_url.clone(),
                    image,
                ]),
                resources: Some(requirements.clone()),
                volume_mounts,
                security_context: Some(hardened_security_context(false)),
                ..Container::default()
            });
        }

        Ok(PodSpec {
            restart_policy: Some("Never".to_string()),
            automount_service_account_token: Some(false),
            volumes: ignore_file_configured.then(|| vec![ignore_file_volume()]),
            containers,
            ..PodSpec::default()
        })
    }

    /// Appends the wiring that depends on the scanned image or on optional
    /// features: the insecure-registry flag, the ignore-file pointer and
    /// references into a pre-existing registry credentials secret.
    fn append_conditional_env(
        &self,
        env: &mut Vec<EnvVar>,
        image: &str,
        container_name: &str,
        credentials: Option<&Secret>,
    ) -> Result<()> {
        let reference = ImageReference::parse(image)?;
        if self.config.is_insecure_registry(&reference.server) {
            env.push(EnvVar {
                name: "TRIVY_INSECURE".to_string(),
                value: Some("true".to_string()),
                ..EnvVar::default()
            });
        }
        if self.config.ignore_file().is_some() {
            env.push(EnvVar {
                name: "TRIVY_IGNOREFILE".to_string(),
                value: Some(IGNORE_FILE_MOUNT_PATH.to_string()),
                ..EnvVar::default()
            });
        }
        if let Some(secret_name) = credentials.and_then(|secret| secret.metadata.name.clone()) {
            env.push(existing_secret_env(
                "TRIVY_USERNAME",
                &secret_name,
                &format!("{container_name}.username"),
            ));
            env.push(existing_secret_env(
                "TRIVY_PASSWORD",
                &secret_name,
                &format!("{container_name}.password"),
            ));
        }
        Ok(())
    }
}

/// Optional reference into the plugin's ConfigMap: a missing key resolves to
/// an empty variable, never a failed pod.
fn config_map_env(name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            config_map_key_ref: Some(ConfigMapKeySelector {
                name: Some(config::CONFIG_MAP_NAME.to_string()),
                key: key.to_string(),
                optional: Some(true),
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}

/// Optional reference into the plugin's Secret.
fn secret_env(name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(config::SECRET_NAME.to_string()),
                key: key.to_string(),
                optional: Some(true),
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}

/// Optional reference into a caller-provided secret.
fn existing_secret_env(name: &str, secret_name: &str, key: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            secret_key_ref: Some(SecretKeySelector {
                name: Some(secret_name.to_string()),
                key: key.to_string(),
                optional: Some(true),
            }),
            ..EnvVarSource::default()
        }),
        ..EnvVar::default()
    }
}

fn cache_volume() -> Volume {
    Volume {
        name: CACHE_VOLUME_NAME.to_string(),
        empty_dir: Some(EmptyDirVolumeSource::default()),
        ..Volume::default()
    }
}

fn cache_volume_mount() -> VolumeMount {
    VolumeMount {
        name: CACHE_VOLUME_NAME.to_string(),
        mount_path: CACHE_DIR.to_string(),
        read_only: Some(false),
        ..VolumeMount::default()
    }
}

fn ignore_file_volume() -> Volume {
    Volume {
        name: IGNORE_FILE_VOLUME_NAME.to_string(),
        config_map: Some(ConfigMapVolumeSource {
            name: Some(config::CONFIG_MAP_NAME.to_string()),
            items: Some(vec![KeyToPath {
                key: config::KEY_IGNORE_FILE.to_string(),
                path: IGNORE_FILE_NAME.to_string(),
                ..KeyToPath::default()
            }]),
            ..ConfigMapVolumeSource::default()
        }),
        ..Volume::default()
    }
}

fn ignore_file_volume_mount() -> VolumeMount {
    VolumeMount {
        name: IGNORE_FILE_VOLUME_NAME.to_string(),
        mount_path: IGNORE_FILE_MOUNT_PATH.to_string(),
        sub_path: Some(IGNORE_FILE_NAME.to_string()),
        read_only: Some(true),
        ..VolumeMount::default()
    }
}

fn hardened_security_context(read_only_root_filesystem: bool) -> SecurityContext {
    SecurityContext {
        privileged: Some(false),
        allow_privilege_escalation: Some(false),
        capabilities: Some(Capabilities {
            drop: Some(vec!["all".to_string()]),
            ..Capabilities::default()
        }),
        read_only_root_filesystem: read_only_root_filesystem.then_some(true),
        ..SecurityContext::default()
    }
}

/// The standalone cache volume only works on linux nodes.
fn linux_node_affinity() -> Affinity {
    Affinity {
        node_affinity: Some(NodeAffinity {
            required_during_scheduling_ignored_during_execution: Some(NodeSelector {
                node_selector_terms: vec![NodeSelectorTerm {
                    match_expressions: Some(vec![NodeSelectorRequirement {
                        key: "kubernetes.io/os".to_string(),
                        operator: "In".to_string(),
                        values: Some(vec!["linux".to_string()]),
                    }]),
                    ..NodeSelectorTerm::default()
                }],
            }),
            ..NodeAffinity::default()
        }),
        ..Affinity::default()
    }
}
