// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/input/event_file.rs - 事件文件输入
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

use std::{fs::File, io::BufReader};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::JsonLinesEvents, url_file_path};

#[derive(Error, Debug)]
pub enum EventFileInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("无法打开事件文件 {path}: {source}")]
  IoError {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// `events:///path/to/session.jsonl`
pub struct EventFileInput {
  path: String,
  reader: BufReader<File>,
}

impl FromUrlWithScheme for EventFileInput {
  const SCHEME: &'static str = "events";
}

impl FromUrl for EventFileInput {
  type Error = EventFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(EventFileInputError::SchemeMismatch);
    }

    let path = url_file_path(url);
    let file = File::open(&path).map_err(|source| EventFileInputError::IoError {
      path: path.clone(),
      source,
    })?;
    info!("打开事件文件: {}", path);

    Ok(EventFileInput {
      path,
      reader: BufReader::new(file),
    })
  }
}

impl EventFileInput {
  pub fn path(&self) -> &str {
    &self.path
  }

  pub fn into_events(self) -> JsonLinesEvents<BufReader<File>> {
    JsonLinesEvents::new(self.reader)
  }
}
