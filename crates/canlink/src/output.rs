use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use canlink_frame::{payload_preview, Delivery};
use canlink_session::SessionReport;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

const PREVIEW_BYTES: usize = 16;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct DeliveryOutput<'a> {
    kind: &'a str,
    id: Option<String>,
    len: usize,
    data: String,
    timestamp: String,
}

pub fn print_delivery(delivery: &Delivery, format: OutputFormat) {
    let payload = delivery.payload();
    let id = delivery.id().map(format_id);

    match format {
        OutputFormat::Json => {
            let out = DeliveryOutput {
                kind: delivery_kind(delivery),
                id,
                len: payload.len(),
                data: payload_preview(payload, payload.len()),
                timestamp: now_unix_millis(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "ID", "LEN", "DATA"])
                .add_row(vec![
                    delivery_kind(delivery).to_string(),
                    id.unwrap_or_else(|| "-".to_string()),
                    payload.len().to_string(),
                    payload_preview(payload, PREVIEW_BYTES),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => match id {
            Some(id) => println!(
                "received id={id} len={} data={}",
                payload.len(),
                payload_preview(payload, PREVIEW_BYTES)
            ),
            None => println!(
                "received message len={} data={}",
                payload.len(),
                payload_preview(payload, PREVIEW_BYTES)
            ),
        },
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    kind: &'a str,
    #[serde(flatten)]
    report: &'a SessionReport,
}

pub fn print_report(report: &SessionReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                kind: "summary",
                report,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "SENT",
                    "FRAMES",
                    "SEND FAILURES",
                    "RECEIVED",
                    "MALFORMED",
                    "READ FAILURES",
                ])
                .add_row(vec![
                    report.messages_sent.to_string(),
                    report.frames_sent.to_string(),
                    report.send_failures.to_string(),
                    report.deliveries.to_string(),
                    report.malformed.to_string(),
                    report.read_failures.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "sent={} frames={} send_failures={} received={} malformed={} read_failures={}",
            report.messages_sent,
            report.frames_sent,
            report.send_failures,
            report.deliveries,
            report.malformed,
            report.read_failures
        ),
        // Raw output carries payload bytes only.
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn format_id(id: u32) -> String {
    format!("0x{id:03X}")
}

fn delivery_kind(delivery: &Delivery) -> &'static str {
    match delivery {
        Delivery::Frame(_) => "frame",
        Delivery::Message(_) => "message",
    }
}

fn now_unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
