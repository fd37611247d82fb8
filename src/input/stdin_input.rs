// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/input/stdin_input.rs - 标准输入事件流
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

use thiserror::Error;
use tracing::info;
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, input::JsonLinesEvents};

#[derive(Error, Debug)]
pub enum StdinInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

/// `stdin:`，通常接在外部检测器进程的管道后面
pub struct StdinInput;

impl FromUrlWithScheme for StdinInput {
  const SCHEME: &'static str = "stdin";
}

impl FromUrl for StdinInput {
  type Error = StdinInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(StdinInputError::SchemeMismatch);
    }
    Ok(StdinInput)
  }
}

impl StdinInput {
  pub fn into_events(self) -> JsonLinesEvents<std::io::StdinLock<'static>> {
    info!("从标准输入读取事件");
    JsonLinesEvents::new(std::io::stdin().lock())
  }
}
