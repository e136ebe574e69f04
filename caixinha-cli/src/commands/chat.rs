//! Chat command - a terminal stand-in for the WhatsApp transport
//!
//! Every line typed becomes an inbound event: `/<option-id>` taps an option,
//! anything else is a text message. Bot messages are rendered as they would
//! appear on the phone, with picklists shown as tables.

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use colored::Colorize;

use caixinha_core::domain::result::Result as CoreResult;
use caixinha_core::ports::{ChoiceOption, Delivery, EventSink, PicklistRow};
use caixinha_core::services::Outcome;
use caixinha_core::InboundEvent;

use super::{get_context, get_logger, runtime};
use crate::output;

const EXIT_COMMAND: &str = "/exit";

/// Prints outbound messages to the terminal
struct TerminalDelivery;

#[async_trait]
impl Delivery for TerminalDelivery {
    async fn send_text(&self, _to: &str, text: &str) -> CoreResult<()> {
        output::bubble(text);
        println!();
        Ok(())
    }

    async fn send_choice(&self, _to: &str, prompt: &str, options: &[ChoiceOption]) -> CoreResult<()> {
        output::bubble(prompt);
        for option in options {
            println!("  {} {}", format!("/{}", option.id).cyan(), option.label.bold());
        }
        println!();
        Ok(())
    }

    async fn send_picklist(
        &self,
        _to: &str,
        prompt: &str,
        button_label: &str,
        rows: &[PicklistRow],
    ) -> CoreResult<()> {
        output::bubble(prompt);
        let mut table = output::table(&[button_label, "", ""]);
        for row in rows {
            table.add_row(vec![format!("/{}", row.id), row.label.clone(), row.description.clone()]);
        }
        println!("{}", table);
        println!();
        Ok(())
    }
}

/// Turn a typed line into an inbound event
fn parse_line(user: &str, line: &str) -> InboundEvent {
    match line.trim().strip_prefix('/') {
        Some(id) if !id.is_empty() => InboundEvent::choice(user, id.trim()),
        _ => InboundEvent::text(user, line.trim()),
    }
}

pub fn run(user: &str) -> Result<()> {
    let ctx = get_context()?;
    let events: Option<Arc<dyn EventSink>> = get_logger().map(|l| Arc::new(l) as Arc<dyn EventSink>);
    let wizard = ctx.wizard(Arc::new(TerminalDelivery), events);
    let runtime = runtime()?;

    output::info(&format!(
        "Chatting as {}. Records go to {}.",
        user,
        ctx.records.path().display()
    ));
    output::info(&format!(
        "Type a message, tap an option with /<id>, or {} to leave.",
        EXIT_COMMAND
    ));
    println!();

    let stdin = io::stdin();
    loop {
        print!("{} ", ">".bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 || line.trim() == EXIT_COMMAND {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match runtime.block_on(wizard.handle(&parse_line(user, &line))) {
            Ok(Outcome::Persisted(record)) => {
                output::success(&format!("Saved record {}", record.id));
            }
            Ok(_) => {}
            Err(e) => output::error(&format!("Message not handled: {}", e)),
        }
    }

    Ok(())
}
