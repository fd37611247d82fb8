// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/input.rs - 监测事件输入
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

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  FromUrl, FromUrlWithScheme, alert::NotificationPermission, config::ConfigUpdate,
  frame::LandmarkFrame,
};

mod json_lines;
pub use self::json_lines::{JsonLinesError, JsonLinesEvents};

mod event_file;
pub use self::event_file::{EventFileInput, EventFileInputError};

mod stdin_input;
pub use self::stdin_input::{StdinInput, StdinInputError};

/// 驱动监测器的事件，一行一个 JSON 对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
  Frame(LandmarkFrame),
  /// 以最近一帧作为基准姿势
  SetReference,
  UpdateConfig(ConfigUpdate),
  Visibility {
    foreground: bool,
  },
  Permission {
    permission: NotificationPermission,
  },
  TestAlert,
  Stop,
}

#[derive(Error, Debug)]
pub enum InputError {
  #[error("事件文件输入错误: {0}")]
  EventFileInputError(#[from] EventFileInputError),
  #[error("标准输入错误: {0}")]
  StdinInputError(#[from] StdinInputError),
  #[error("事件流读取错误: {0}")]
  JsonLinesError(#[from] JsonLinesError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

pub enum InputWrapper {
  EventFile(EventFileInput),
  Stdin(StdinInput),
}

impl FromUrl for InputWrapper {
  type Error = InputError;

  fn from_url(url: &url::Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      EventFileInput::SCHEME => Ok(InputWrapper::EventFile(EventFileInput::from_url(url)?)),
      StdinInput::SCHEME => Ok(InputWrapper::Stdin(StdinInput::from_url(url)?)),
      other => Err(InputError::SchemeMismatch(other.to_string())),
    }
  }
}

impl InputWrapper {
  pub fn into_events(self) -> InputWrapperIter {
    match self {
      InputWrapper::EventFile(input) => InputWrapperIter::EventFile(input.into_events()),
      InputWrapper::Stdin(input) => InputWrapperIter::Stdin(input.into_events()),
    }
  }
}

pub enum InputWrapperIter {
  EventFile(JsonLinesEvents<std::io::BufReader<std::fs::File>>),
  Stdin(JsonLinesEvents<std::io::StdinLock<'static>>),
}

impl Iterator for InputWrapperIter {
  type Item = Result<MonitorEvent, InputError>;

  fn next(&mut self) -> Option<Self::Item> {
    match self {
      InputWrapperIter::EventFile(input) => input.next().map(|r| r.map_err(InputError::from)),
      InputWrapperIter::Stdin(input) => input.next().map(|r| r.map_err(InputError::from)),
    }
  }
}
