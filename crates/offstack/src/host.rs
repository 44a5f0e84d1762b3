//! Host-framework surface: the declarative config loader and the plain-data
//! registry metadata a plugin host discovers.
//!
//! The host framework owns plugin discovery and hook dispatch; this module
//! only hands it data. `commands()` and `hooks()` describe the command table
//! and the lifecycle events that map onto [`LifecycleController`] entry
//! points; `load_declared_options` pulls the project's declarative layer out
//! of its descriptor.
//!
//! [`LifecycleController`]: crate::LifecycleController

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use offstack_config::{defaults, RawOptions};

/// Which [`LifecycleController`] entry point a hook dispatches to.
///
/// [`LifecycleController`]: crate::LifecycleController
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPoint {
    /// Hooked-mode startup; returns without blocking.
    OnBegin,
    /// Hooked-mode teardown.
    OnEnd,
    /// Blocking standalone run.
    StartStandalone,
}

/// One command-line flag as the host registry presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: &'static str,
    pub shortcut: char,
    pub usage: &'static str,
}

/// One command the host exposes for this plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub lifecycle_events: &'static [&'static str],
    pub flags: &'static [FlagSpec],
}

/// One lifecycle hook this plugin consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookSpec {
    pub event: &'static str,
    pub entry_point: EntryPoint,
}

/// Flag table of the `start` command. Shortcut letters are the historical
/// ones, including `h` for `sharedDb`; the standalone clap CLI keeps `-h`
/// for help and exposes that flag long-only (see [`crate::cli`]).
pub const START_FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: "port",
        shortcut: 'p',
        usage: "Port the gateway serves the API access point on. Dynamic when omitted.",
    },
    FlagSpec {
        name: "dynamoDbPort",
        shortcut: 'd',
        usage: "Port DynamoDB uses to communicate with your application. Dynamic when omitted.",
    },
    FlagSpec {
        name: "inMemory",
        shortcut: 'i',
        usage: "Run the database in memory; data is lost when the run ends.",
    },
    FlagSpec {
        name: "dbPath",
        shortcut: 'b',
        usage: "Directory where the database writes its files. Defaults to <servicePath>/.dynamodb.",
    },
    FlagSpec {
        name: "sharedDb",
        shortcut: 'h',
        usage: "Use a single database file regardless of credentials and region.",
    },
    FlagSpec {
        name: "delayTransientStatuses",
        shortcut: 't',
        usage: "Introduce delays for transient table statuses like the real service.",
    },
    FlagSpec {
        name: "optimizeDbBeforeStartup",
        shortcut: 'o',
        usage: "Optimize the underlying tables before starting up. Requires dbPath.",
    },
];

/// Commands this plugin registers with the host.
pub fn commands() -> Vec<CommandSpec> {
    vec![CommandSpec {
        name: "start",
        usage: "Starts the local DynamoDB emulator and the API gateway emulation",
        lifecycle_events: &["startHandler"],
        flags: START_FLAGS,
    }]
}

/// Lifecycle hooks this plugin consumes, mapped to their entry points.
pub fn hooks() -> Vec<HookSpec> {
    vec![
        HookSpec {
            event: "offstack:start:startHandler",
            entry_point: EntryPoint::StartStandalone,
        },
        HookSpec {
            event: "before:offline:start:init",
            entry_point: EntryPoint::OnBegin,
        },
        HookSpec {
            event: "before:offline:start:end",
            entry_point: EntryPoint::OnEnd,
        },
    ]
}

/// Load the declarative configuration layer from the project descriptor.
///
/// Reads `<service_path>/serverless.yml` and extracts the `custom.offstack`
/// block. A missing descriptor, missing `custom` section, or absent block
/// is legitimate and yields the empty layer; a block that is present but
/// does not deserialize into [`RawOptions`] is an error.
pub fn load_declared_options(service_path: &Path) -> Result<RawOptions> {
    let descriptor = service_path.join(defaults::SERVICE_DESCRIPTOR);
    let text = match std::fs::read_to_string(&descriptor) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(RawOptions::default()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read {}", descriptor.display()))
        }
    };

    let doc: serde_yaml::Value = serde_yaml::from_str(&text)
        .with_context(|| format!("invalid YAML in {}", descriptor.display()))?;

    let Some(block) = doc
        .get("custom")
        .and_then(|custom| custom.get(defaults::CUSTOM_BLOCK_KEY))
    else {
        return Ok(RawOptions::default());
    };

    serde_yaml::from_value(block.clone()).with_context(|| {
        format!(
            "invalid custom.{} block in {}",
            defaults::CUSTOM_BLOCK_KEY,
            descriptor.display()
        )
    })
}
