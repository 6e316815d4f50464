//! Engine command line

use crate::cluster::InitialClusterState;
use crate::common::{Config, NodeIdentity};
use std::path::Path;

/// Full engine argument list for this node.
pub fn engine_args(
    config: &Config,
    identity: &NodeIdentity,
    initial: &InitialClusterState,
) -> Vec<String> {
    let engine = &config.engine;
    let mut args = Vec::new();

    push(&mut args, "--name", &identity.name);
    push(&mut args, "--data-dir", &display(&engine.data_dir));
    push(&mut args, "--heartbeat-interval", &engine.heartbeat_interval_ms.to_string());
    push(&mut args, "--election-timeout", &engine.election_timeout_ms.to_string());
    push(&mut args, "--listen-peer-urls", &identity.listen_peer_url);
    push(&mut args, "--listen-client-urls", &identity.listen_client_url);
    push(&mut args, "--initial-advertise-peer-urls", &identity.advertise_peer_url);
    push(&mut args, "--advertise-client-urls", &identity.advertise_client_url);

    if engine.debug {
        args.push("--debug".to_string());
    }

    let tls = &engine.tls;
    if engine.client_require_ssl {
        args.push("--client-cert-auth".to_string());
        push_path(&mut args, "--trusted-ca-file", tls.ca_cert.as_deref());
        push_path(&mut args, "--cert-file", tls.server_cert.as_deref());
        push_path(&mut args, "--key-file", tls.server_key.as_deref());
    }
    if engine.peer_require_ssl {
        args.push("--peer-client-cert-auth".to_string());
        push_path(&mut args, "--peer-trusted-ca-file", tls.peer_ca_cert.as_deref());
        push_path(&mut args, "--peer-cert-file", tls.peer_cert.as_deref());
        push_path(&mut args, "--peer-key-file", tls.peer_key.as_deref());
    }

    push(&mut args, "--initial-cluster", &initial.members);
    push(&mut args, "--initial-cluster-state", initial.state.as_str());
    args
}

fn push(args: &mut Vec<String>, flag: &str, value: &str) {
    args.push(flag.to_string());
    args.push(value.to_string());
}

fn push_path(args: &mut Vec<String>, flag: &str, value: Option<&Path>) {
    if let Some(path) = value {
        push(args, flag, &display(path));
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
