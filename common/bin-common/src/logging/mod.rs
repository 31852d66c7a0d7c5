// Copyright 2026 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSettings {
    /// Directive used when `RUST_LOG` is not set, for example `info` or `nexus_mining=debug`.
    pub default_directive: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            default_directive: "info".to_string(),
        }
    }
}

// don't call init so that we could attach additional layers
#[cfg(feature = "basic_tracing")]
pub fn build_tracing_logger(
    settings: &LoggingSettings,
) -> impl tracing_subscriber::layer::SubscriberExt {
    use tracing_subscriber::prelude::*;

    tracing_subscriber::registry()
        .with(default_tracing_fmt_layer(std::io::stderr))
        .with(tracing_env_filter(settings))
}

#[cfg(feature = "basic_tracing")]
pub fn tracing_env_filter(settings: &LoggingSettings) -> tracing_subscriber::filter::EnvFilter {
    if ::std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::filter::EnvFilter::from_default_env()
    } else {
        // if the env value was not found, default to the configured directive (`INFO` unless changed)
        tracing_subscriber::filter::EnvFilter::builder()
            .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
            .parse_lossy(&settings.default_directive)
    }
}

#[cfg(feature = "basic_tracing")]
pub fn default_tracing_fmt_layer<S, W>(
    writer: W,
) -> impl tracing_subscriber::Layer<S> + Sync + Send + 'static
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Sync + Send + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        // Use a more compact, abbreviated log format
        .compact()
        // Display source code file paths
        .with_file(true)
        // Display source code line numbers
        .with_line_number(true)
        // Don't display the event's target (module path)
        .with_target(false)
}

#[cfg(feature = "basic_tracing")]
pub fn setup_tracing_logger(settings: &LoggingSettings) {
    use tracing_subscriber::util::SubscriberInitExt;
    build_tracing_logger(settings).init()
}

pub fn banner(crate_name: &str, crate_version: &str) -> String {
    format!(
        r#"

      _ __   _____  ___   _ ___
     | '_ \ / _ \ \/ / | | / __|
     | | | |  __/>  <| |_| \__ \
     |_| |_|\___/_/\_\\__,_|___/

             ({crate_name} - version {crate_version})

    "#
    )
}

pub fn maybe_print_banner(crate_name: &str, crate_version: &str) {
    if std::io::stdout().is_terminal() {
        println!("{}", banner(crate_name, crate_version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_includes_name_and_version() {
        let banner = banner("nexus-mining", "1.2.3");
        assert!(banner.contains("(nexus-mining - version 1.2.3)"));
    }
}
