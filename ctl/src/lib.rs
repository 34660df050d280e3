//! The mesh-ctl command implementations

pub mod config;

use crate::config::{Command, Config, LedState};
use anyhow::{Context, Result};
use itertools::Itertools;
use shared::address_book::AddressBook;
use shared::msg::{DfuTrigger, LedSet, Reset, Target};
use shared::tracker::HeartbeatTracker;
use shared::transport::{CommandSender, HeartbeatListener};
use std::time::Duration;
use tokio::time::sleep;

/// Executes the configured command
///
/// `blink` and `listen` never return on success, they are meant to be cancelled by the caller.
pub async fn run(config: &Config) -> Result<()> {
    match &config.command {
        Command::Reset(target) => {
            let target = target.resolve(&config.address_book)?;
            let sender = CommandSender::with_dest(config.command_addr).await?;

            sender.send(&Reset::new(target)).await?;
            println!("Sent reset to {target}");
        }
        Command::Dfu(target) => {
            let target = target.resolve(&config.address_book)?;
            let sender = CommandSender::with_dest(config.command_addr).await?;

            sender.send(&DfuTrigger::new(target)).await?;
            println!("Sent DFU trigger to {target}");
        }
        Command::DfuSequential { interval } => {
            let sender = CommandSender::with_dest(config.command_addr).await?;
            dfu_sequential(
                &sender,
                &config.address_book,
                interval.unwrap_or(config.dfu_interval),
            )
            .await?;
        }
        Command::Led { state, target } => {
            let target = target.resolve(&config.address_book)?;
            let sender = CommandSender::with_dest(config.command_addr).await?;

            sender.send(&LedSet::new(target, state.is_on())).await?;
            println!("Switched LED {} on {target}", led_str(*state));
        }
        Command::Blink { target, interval } => {
            let target = target.resolve(&config.address_book)?;
            let sender = CommandSender::with_dest(config.command_addr).await?;
            blink(&sender, target, interval.unwrap_or(config.blink_interval)).await?;
        }
        Command::Listen => {
            let mut listener = HeartbeatListener::bind(
                config.heartbeat_addr,
                HeartbeatTracker::new(config.address_book.clone()),
            )
            .await?;

            println!("Waiting for heartbeats on {}", listener.local_addr()?);
            listener.run(|sighting| println!("{sighting}")).await?;
        }
        Command::Nodes => print_nodes(&config.address_book),
    }

    Ok(())
}

/// Triggers a firmware update on each node of the address book in order, waiting `interval`
/// in between
///
/// Stops at the first failed send. Nodes after it are not triggered.
pub async fn dfu_sequential(
    sender: &CommandSender,
    address_book: &AddressBook,
    interval: Duration,
) -> Result<()> {
    for (i, e) in address_book.entries().iter().enumerate() {
        if i > 0 {
            sleep(interval).await;
        }

        sender
            .send(&DfuTrigger::new(Target::Unicast(e.mac)))
            .await
            .with_context(|| {
                format!("Triggering firmware update on node {} ({}) failed", e.index, e.mac)
            })?;
        println!("Sent DFU trigger to node {} ({})", e.index, e.mac);
    }

    log::info!("Triggered firmware update on {} nodes", address_book.len());

    Ok(())
}

/// Switches the LED on and off every `interval`, starting with on. Runs until sending fails.
pub async fn blink(sender: &CommandSender, target: Target, interval: Duration) -> Result<()> {
    log::info!("Blinking LED on {target} every {interval:?}");

    for state in [LedState::On, LedState::Off].into_iter().cycle() {
        sender.send(&LedSet::new(target, state.is_on())).await?;
        println!("LED {}", led_str(state));

        sleep(interval).await;
    }

    Ok(())
}

fn led_str(state: LedState) -> &'static str {
    match state {
        LedState::On => "on",
        LedState::Off => "off",
    }
}

fn print_nodes(address_book: &AddressBook) {
    println!("{:>5}  {:<17}  Position", "Node", "MAC");
    println!(
        "{}",
        address_book
            .entries()
            .iter()
            .map(|e| format!("{:>5}  {}  {}", e.index, e.mac, e.position))
            .join("\n")
    );
}
