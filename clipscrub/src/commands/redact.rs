// clipscrub/src/commands/redact.rs
//! `clipscrub redact`: runs text through the paste pipeline and prints it.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clipscrub_core::{
    hostname_from_url, Clipboard, PasteDisposition, PasteHandler, RedactionContext,
    RedactionOutcome, RegexEngine, SanitizationEngine, SiteGate, SiteMatchMode, HOSTNAME_TOKEN,
};

use super::{info_msg, warn_msg};
use crate::cli::RedactCommand;
use crate::utils::app_state::AppState;
use crate::utils::clipboard::SystemClipboard;

/// Options for the `redact` command, resolved from the CLI.
pub struct RedactOptions {
    pub input: Option<PathBuf>,
    pub url: String,
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub env_context: bool,
    pub clipboard: bool,
    pub ignore_sites: bool,
    pub summary: bool,
    pub site_mode: SiteMatchMode,
}

impl RedactOptions {
    pub fn from_command(cmd: RedactCommand, site_mode: SiteMatchMode) -> Self {
        Self {
            input: cmd.input,
            url: cmd.url,
            username: cmd.username,
            hostname: cmd.hostname,
            env_context: !cmd.no_env_context,
            clipboard: cmd.clipboard,
            ignore_sites: cmd.ignore_sites,
            summary: cmd.summary,
            site_mode,
        }
    }
}

/// Builds the redaction context for one invocation.
///
/// Precedence for the hostname is `--hostname`, then the host of `--url`,
/// then the machine hostname from the environment. A machine hostname that
/// loses to one of the others is still redacted as an extra rule.
pub fn build_context(opts: &RedactOptions, environment: RedactionContext) -> RedactionContext {
    let mut context = environment;
    if let Some(username) = &opts.username {
        context.username = Some(username.clone());
    }

    let machine = context.hostname.take();
    context.hostname = opts
        .hostname
        .clone()
        .or_else(|| hostname_from_url(&opts.url))
        .or_else(|| machine.clone());

    if let Some(machine) = machine {
        if context.hostname.as_deref() != Some(machine.as_str()) {
            context = context.with_extra(machine, HOSTNAME_TOKEN);
        }
    }
    context
}

pub async fn run_redact(state: &AppState, opts: RedactOptions) -> Result<()> {
    info!("Starting redact operation.");
    let environment = if opts.env_context {
        RedactionContext::from_environment()
    } else {
        RedactionContext::default()
    };
    let context = build_context(&opts, environment);

    if opts.clipboard {
        return redact_clipboard(state, &opts, &context).await;
    }

    let input = read_input(opts.input.as_ref())?;
    let output = match redact_text(state, &opts, &context, &input).await {
        Some(outcome) => {
            if opts.summary {
                print_summary(&outcome);
            }
            outcome.text
        }
        None => input,
    };

    write_output(&output)?;
    info!("Redact operation completed.");
    Ok(())
}

/// Redacts `input` with the stored rules. `None` means the text passes
/// through unchanged: the site is not allowed or no rules are available.
async fn redact_text(
    state: &AppState,
    opts: &RedactOptions,
    context: &RedactionContext,
    input: &str,
) -> Option<RedactionOutcome> {
    let rule_set = match state.store.load().await {
        Ok(rule_set) => rule_set,
        Err(e) => {
            warn_msg(format!("Rules unavailable, text left unredacted: {}", e));
            return None;
        }
    };

    if !opts.ignore_sites && !SiteGate::from_rule_set(&rule_set, opts.site_mode).is_allowed(&opts.url) {
        info_msg(format!("Site not allowed, text left unchanged: '{}'", opts.url));
        return None;
    }

    let engine: Box<dyn SanitizationEngine> = Box::new(RegexEngine::new(rule_set));
    let outcome = engine.redact_detailed(input, context);
    for warning in &outcome.warnings {
        warn!("{}", warning);
    }
    debug!(
        "Content redacted. Original length: {}, redacted length: {}",
        input.len(),
        outcome.text.len()
    );
    Some(outcome)
}

async fn redact_clipboard(state: &AppState, opts: &RedactOptions, context: &RedactionContext) -> Result<()> {
    let clipboard = SystemClipboard;

    if opts.ignore_sites {
        let input = clipboard.read_text().await.context("Failed to read the clipboard")?;
        let Some(outcome) = redact_text(state, opts, context, &input).await else {
            return write_output(&input);
        };
        if outcome.changed() {
            if let Err(e) = clipboard.write_text(&outcome.text).await {
                warn_msg(format!("Failed to copy to clipboard: {}", e));
            }
        }
        if opts.summary {
            print_summary(&outcome);
        }
        return write_output(&outcome.text);
    }

    let handler = PasteHandler::with_site_mode(state.store.clone(), opts.site_mode);
    let outcome = handler
        .process_clipboard(&clipboard, &opts.url, None, context)
        .await
        .context("Failed to read the clipboard")?;

    match &outcome.disposition {
        PasteDisposition::Redacted { replacements, warnings } => {
            for warning in warnings {
                warn!("{}", warning);
            }
            if opts.summary {
                info_msg(format!("{} replacement(s) made.", replacements));
            }
        }
        PasteDisposition::SiteNotAllowed => {
            info_msg(format!("Site not allowed, clipboard left unchanged: '{}'", opts.url));
        }
        PasteDisposition::PassThrough { reason } => {
            warn_msg(format!("Rules unavailable, clipboard left unredacted: {}", reason));
        }
        PasteDisposition::Superseded => {}
    }
    write_output(&outcome.text)
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading input from file: {}", path.display());
            fs::read_to_string(path).with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin...");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Writes `text` byte for byte; no newline is added.
fn write_output(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

fn print_summary(outcome: &RedactionOutcome) {
    let mut stderr = io::stderr();
    let _ = writeln!(stderr, "--- Redaction Summary ---");
    if outcome.summary.is_empty() {
        let _ = writeln!(stderr, "No redactions applied.");
    }
    for item in &outcome.summary {
        let _ = writeln!(
            stderr,
            "#{} {} -> {} ({} occurrences)",
            item.rule_index, item.pattern, item.replacement, item.occurrences
        );
    }
}
