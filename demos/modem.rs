//! Talks to a simulated modem. A task stands in for the UART RX interrupt and feeds
//! every received byte into the driver.
//!
//! ```not_rust
//! cargo run --example modem
//! ```

use core::error::Error;
use std::time::Duration;

use atframe::{AtMaster, AtWriter, Message, ResponseKind, status::NoStatus};
use embedded_io_adapters::tokio_1::FromTokio;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

static AT: AtMaster<'static, NoStatus, 256> = AtMaster::new(b"OK", b"ERROR", NoStatus);

/// Polls the driver until a final result code or the init banner arrives.
async fn wait_final() -> Message<64> {
    loop {
        match AT.next_message::<64>() {
            Some(message) => match message.kind {
                ResponseKind::BlankLine => {}
                ResponseKind::Other => {
                    tracing::info!(target: "host", payload = message.as_str().unwrap_or("?"), "information response");
                }
                _ => return message,
            },
            None => tokio::time::sleep(Duration::from_millis(5)).await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("modem=info,host=info")
        .init();

    let (host_tx, modem_rx) = tokio::io::duplex(256);
    let (mut modem_tx, mut host_rx) = tokio::io::duplex(256);

    let modem = tokio::spawn(async move {
        modem_tx.write_all(b"\r\nRDY\r\n").await?;

        let mut lines = BufReader::new(modem_rx).lines();

        while let Some(line) = lines.next_line().await? {
            tracing::info!(target: "modem", %line, "received command");

            let reply: &[u8] = match line.as_str() {
                "AT" | "ATE0" => b"\r\nOK\r\n",
                "AT+CSQ" => b"\r\n+CSQ: 21,99\r\n\r\nOK\r\n",
                "AT+CPIN?" => b"\r\n+CME ERROR: 10\r\n",
                _ => b"\r\nERROR\r\n",
            };

            modem_tx.write_all(reply).await?;
        }

        Ok::<(), std::io::Error>(())
    });

    tokio::spawn(async move {
        let mut byte = [0_u8; 1];

        while host_rx.read_exact(&mut byte).await.is_ok() {
            AT.on_byte(byte[0]);
        }
    });

    AT.set_init_prefix(b"RDY");
    AT.set_custom_prefix(b"+CME ERROR");

    let message = wait_final().await;
    tracing::info!(target: "host", kind = %message.kind, "modem is up");

    let buffer = &mut [0_u8; 64];
    let mut writer = AtWriter::new(FromTokio::new(host_tx), buffer);

    for command in ["ATE0", "AT+CSQ", "AT+CPIN?", "AT+BOGUS"] {
        writer.send_command(command).await?;

        let message = wait_final().await;

        tracing::info!(
            target: "host",
            command,
            kind = %message.kind,
            payload = message.as_str().unwrap_or("?"),
            "final result"
        );
    }

    drop(writer);

    modem.await??;

    tracing::info!(target: "host", dropped = AT.dropped(), "done");

    Ok(())
}
