// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/output/record.rs - 判定结果记录
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::LandmarkFrame,
  monitor::{FrameOutcome, PostureState},
  output::{Render, view::status_view},
  url_file_path,
};

#[derive(Error, Debug)]
pub enum RecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无法创建记录文件 {path}: {source}")]
  CreateError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("写入记录失败: {0}")]
  IoError(#[from] std::io::Error),
  #[error("序列化失败: {0}")]
  JsonError(#[from] serde_json::Error),
  #[error("记录文件锁已损坏")]
  Poisoned,
}

#[derive(Serialize)]
struct OutcomeRecord<'a> {
  recorded_at: String,
  landmarks: usize,
  headline: String,
  color: &'static str,
  #[serde(flatten)]
  outcome: &'a FrameOutcome,
}

/// `record:///path/to/log.jsonl` 每个监测帧写一行 JSON；加 `?always` 连未设置基准的帧也记录
pub struct RecordOutput {
  path: PathBuf,
  always: bool,
  writer: Mutex<BufWriter<File>>,
}

impl FromUrlWithScheme for RecordOutput {
  const SCHEME: &'static str = "record";
}

impl FromUrl for RecordOutput {
  type Error = RecordOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(RecordOutputError::SchemeMismatch);
    }

    let path = PathBuf::from(url_file_path(url));
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(|source| RecordOutputError::CreateError {
        path: path.clone(),
        source,
      })?;
    }
    let file = File::create(&path).map_err(|source| RecordOutputError::CreateError {
      path: path.clone(),
      source,
    })?;
    let always = url.query_pairs().any(|(k, _)| k == "always");

    info!("判定结果写入 {}", path.display());
    Ok(RecordOutput {
      path,
      always,
      writer: Mutex::new(BufWriter::new(file)),
    })
  }
}

impl RecordOutput {
  pub fn path(&self) -> &std::path::Path {
    &self.path
  }
}

impl Render<LandmarkFrame, FrameOutcome> for RecordOutput {
  type Error = RecordOutputError;

  fn render_result(&self, frame: &LandmarkFrame, result: &FrameOutcome) -> Result<(), Self::Error> {
    if result.state == PostureState::Idle && !self.always {
      return Ok(());
    }

    let view = status_view(result);
    let record = OutcomeRecord {
      recorded_at: chrono::Utc::now().to_rfc3339(),
      landmarks: frame.len(),
      headline: view.headline,
      color: view.landmark_color.hex(),
      outcome: result,
    };
    let line = serde_json::to_string(&record)?;

    let mut writer = self
      .writer
      .lock()
      .map_err(|_| RecordOutputError::Poisoned)?;
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    debug!("记录 {:.0}ms 的判定结果", result.timestamp_ms);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn outcome(state: PostureState) -> FrameOutcome {
    FrameOutcome {
      timestamp_ms: 250.0,
      state,
      deviation_percent: Some(7),
      deviation: None,
      over_threshold: false,
      should_alert: false,
      overlay: false,
      accumulated_seconds: 0.0,
      alert_delay_seconds: 3.0,
      skipped: None,
    }
  }

  fn record_url(path: &std::path::Path, query: &str) -> Url {
    let mut url = Url::from_file_path(path).unwrap();
    url.set_query(if query.is_empty() { None } else { Some(query) });
    let text = url.as_str().replacen("file:", "record:", 1);
    Url::parse(&text).unwrap()
  }

  #[test]
  fn writes_one_line_per_monitored_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("log.jsonl");
    let output = RecordOutput::from_url(&record_url(&path, "")).unwrap();
    let frame = LandmarkFrame::empty(250.0);

    output.render_result(&frame, &outcome(PostureState::Idle)).unwrap();
    output.render_result(&frame, &outcome(PostureState::Good)).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 1);
    let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(value["state"], "good");
    assert_eq!(value["deviation_percent"], 7);
    assert_eq!(value["headline"], "姿势端正");
    assert!(value["recorded_at"].is_string());
  }

  #[test]
  fn always_keeps_idle_frames() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.jsonl");
    let output = RecordOutput::from_url(&record_url(&path, "always")).unwrap();
    output
      .render_result(&LandmarkFrame::empty(0.0), &outcome(PostureState::Idle))
      .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1);
  }
}
