use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{self, Write};
use uuid::Uuid;

pub const SCHEMA_VERSION: &str = "gator.v1";

#[derive(Debug, Clone, Serialize, Default)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
}

#[derive(Debug, Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub schema_version: &'static str,
    pub time: DateTime<Utc>,
    pub request_id: Uuid,
    pub op: &'a str,
    pub apply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<'a, T: Serialize> Envelope<'a, T> {
    pub fn plan(op: &'a str, plan: &'a T, meta: Option<Meta>) -> Self {
        Envelope { schema_version: SCHEMA_VERSION, time: Utc::now(), request_id: Uuid::new_v4(), op, apply: false, plan: Some(plan), result: None, meta }
    }

    pub fn result(op: &'a str, result: &'a T, meta: Option<Meta>) -> Self {
        Envelope { schema_version: SCHEMA_VERSION, time: Utc::now(), request_id: Uuid::new_v4(), op, apply: true, plan: None, result: Some(result), meta }
    }
}

pub fn print_plan<T: Serialize>(op: &str, plan: &T, meta: Option<Meta>) -> Result<()> {
    write_line(&Envelope::plan(op, plan, meta))
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    write_line(&Envelope::result(op, result, meta))
}

fn write_line<T: Serialize>(env: &T) -> Result<()> {
    let mut out = io::stdout().lock();
    serde_json::to_writer(&mut out, env)?;
    writeln!(&mut out)?;
    out.flush()?;
    Ok(())
}
