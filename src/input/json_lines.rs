// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/input/json_lines.rs - JSON Lines 事件流
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

use std::io::BufRead;

use thiserror::Error;
use tracing::{debug, error};

use crate::input::MonitorEvent;

#[derive(Error, Debug)]
pub enum JsonLinesError {
  #[error("第 {line} 行读取失败: {source}")]
  IoError {
    line: usize,
    #[source]
    source: std::io::Error,
  },
}

/// 逐行解析事件；格式错误的行记录日志后跳过，I/O 错误结束事件流
pub struct JsonLinesEvents<R> {
  reader: R,
  line: usize,
  buffer: Vec<u8>,
  failed: bool,
}

impl<R: BufRead> JsonLinesEvents<R> {
  pub fn new(reader: R) -> Self {
    Self {
      reader,
      line: 0,
      buffer: Vec::new(),
      failed: false,
    }
  }

  pub fn line(&self) -> usize {
    self.line
  }
}

impl<R: BufRead> Iterator for JsonLinesEvents<R> {
  type Item = Result<MonitorEvent, JsonLinesError>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.failed {
      return None;
    }

    loop {
      self.buffer.clear();
      self.line += 1;
      match self.reader.read_until(b'\n', &mut self.buffer) {
        Ok(0) => return None,
        Ok(_) => {}
        Err(source) => {
          self.failed = true;
          return Some(Err(JsonLinesError::IoError {
            line: self.line,
            source,
          }));
        }
      }

      let text = match std::str::from_utf8(&self.buffer) {
        Ok(text) => text.trim(),
        Err(e) => {
          error!("第 {} 行不是有效的 UTF-8，已跳过: {}", self.line, e);
          continue;
        }
      };
      if text.is_empty() || text.starts_with('#') {
        continue;
      }

      match serde_json::from_str::<MonitorEvent>(text) {
        Ok(event) => {
          debug!("读取第 {} 行事件", self.line);
          return Some(Ok(event));
        }
        Err(e) => {
          error!("第 {} 行无法解析，已跳过: {}", self.line, e);
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Cursor;

  #[test]
  fn skips_blank_comment_and_malformed_lines() {
    let text = concat!(
      "# 录制于书房\n",
      "\n",
      "{\"event\":\"set_reference\"}\n",
      "not json\n",
      "{\"event\":\"frame\",\"timestamp_ms\":1}\n",
      "{\"event\":\"stop\"}",
    );
    let events: Vec<_> = JsonLinesEvents::new(Cursor::new(text))
      .collect::<Result<_, _>>()
      .unwrap();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], MonitorEvent::SetReference);
    assert_eq!(events[2], MonitorEvent::Stop);
  }

  #[test]
  fn invalid_utf8_line_is_skipped() {
    let mut bytes = b"{\"event\":\"set_reference\"}\n".to_vec();
    bytes.extend_from_slice(b"\xff\xfe garbage\n");
    bytes.extend_from_slice(b"{\"event\":\"stop\"}\n");

    let mut events = JsonLinesEvents::new(Cursor::new(bytes));
    assert_eq!(events.next().unwrap().unwrap(), MonitorEvent::SetReference);
    assert_eq!(events.next().unwrap().unwrap(), MonitorEvent::Stop);
    assert_eq!(events.line(), 3);
    assert!(events.next().is_none());
  }

  struct Broken;

  impl std::io::Read for Broken {
    fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
      Err(std::io::Error::other("camera unplugged"))
    }
  }

  #[test]
  fn io_error_ends_stream() {
    let mut events = JsonLinesEvents::new(std::io::BufReader::new(Broken));
    assert!(matches!(
      events.next(),
      Some(Err(JsonLinesError::IoError { line: 1, .. }))
    ));
    assert!(events.next().is_none());
  }
}
