// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/output/console.rs - 终端输出与终端提醒
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

use std::io::Write;
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  alert::{AlertError, AlertSink, BeepTone, Notification},
  frame::LandmarkFrame,
  monitor::FrameOutcome,
  output::{
    Render,
    title::{TitleFlash, TitleFrame, WARNING_TITLE},
    view::status_view,
  },
};

const ANSI_RESET: &str = "\x1b[0m";

#[derive(Error, Debug)]
pub enum ConsoleOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// `console:` 在状态文字变化时打印一行；`console:?verbose` 每帧都打印
pub struct ConsoleOutput {
  verbose: bool,
  color: bool,
  last_headline: Mutex<Option<String>>,
}

impl FromUrlWithScheme for ConsoleOutput {
  const SCHEME: &'static str = "console";
}

impl FromUrl for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ConsoleOutputError::SchemeMismatch);
    }

    let verbose = url.query_pairs().any(|(k, _)| k == "verbose");
    let color = !url.query_pairs().any(|(k, _)| k == "no-color");

    Ok(ConsoleOutput {
      verbose,
      color,
      last_headline: Mutex::new(None),
    })
  }
}

impl ConsoleOutput {
  fn status_line(&self, result: &FrameOutcome) -> Option<String> {
    let view = status_view(result);
    let mut last = match self.last_headline.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let changed = last.as_deref() != Some(view.headline.as_str());
    if !changed && !self.verbose {
      return None;
    }
    *last = Some(view.headline.clone());

    let line = if self.color {
      format!(
        "{}{}{} 偏差 {}",
        view.headline_color.ansi(),
        view.headline,
        ANSI_RESET,
        view.deviation_text
      )
    } else {
      format!("{} 偏差 {}", view.headline, view.deviation_text)
    };
    Some(line)
  }
}

impl Render<LandmarkFrame, FrameOutcome> for ConsoleOutput {
  type Error = ConsoleOutputError;

  fn render_result(&self, frame: &LandmarkFrame, result: &FrameOutcome) -> Result<(), Self::Error> {
    if let Some(line) = self.status_line(result) {
      let mut stdout = std::io::stdout().lock();
      writeln!(stdout, "[{:>10.0}ms] {}", frame.timestamp_ms, line)?;
    }
    Ok(())
  }
}

/// 终端上的提醒：响铃代替提示音，OSC 标题序列代替窗口标题闪烁，日志代替系统通知
pub struct ConsoleAlertSink<W = std::io::Stderr> {
  out: W,
  title: String,
  flash: TitleFlash,
  shown: TitleFrame,
  overlay: bool,
  bell: bool,
}

impl ConsoleAlertSink<std::io::Stderr> {
  pub fn stderr(title: impl Into<String>) -> Self {
    Self::new(std::io::stderr(), title)
  }
}

impl<W: Write> ConsoleAlertSink<W> {
  pub fn new(out: W, title: impl Into<String>) -> Self {
    Self {
      out,
      title: title.into(),
      flash: TitleFlash::default(),
      shown: TitleFrame::Original,
      overlay: false,
      bell: true,
    }
  }

  pub fn with_bell(mut self, bell: bool) -> Self {
    self.bell = bell;
    self
  }

  pub fn overlay(&self) -> bool {
    self.overlay
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  /// 按闪烁时间表刷新终端标题
  pub fn refresh_title(&mut self, now_ms: f64) -> std::io::Result<()> {
    let frame = self.flash.title_at(now_ms);
    if frame == self.shown {
      return Ok(());
    }
    let text = match frame {
      TitleFrame::Warning => WARNING_TITLE,
      TitleFrame::Original => self.title.as_str(),
    };
    write!(self.out, "\x1b]0;{}\x07", text)?;
    self.out.flush()?;
    self.shown = frame;
    Ok(())
  }
}

impl<W: Write> AlertSink for ConsoleAlertSink<W> {
  fn set_overlay(&mut self, active: bool) {
    if active != self.overlay {
      if active {
        warn!("姿势提醒遮罩已打开");
      } else {
        info!("姿势提醒遮罩已关闭");
      }
    }
    self.overlay = active;
  }

  fn play_beep(&mut self, tone: &BeepTone) -> Result<(), AlertError> {
    debug!(
      "提示音: {:?} {:.0}Hz -> {:.0}Hz, {:.1}s",
      tone.waveform, tone.start_hz, tone.end_hz, tone.duration_seconds
    );
    if self.bell {
      self.out.write_all(b"\x07")?;
      self.out.flush()?;
    }
    Ok(())
  }

  fn flash_title(&mut self, now_ms: f64) {
    if self.flash.start(now_ms)
      && let Err(e) = self.refresh_title(now_ms)
    {
      warn!("终端标题更新失败: {}", e);
    }
  }

  fn tick(&mut self, now_ms: f64) {
    if let Err(e) = self.refresh_title(now_ms) {
      warn!("终端标题更新失败: {}", e);
    }
  }

  fn notify(&mut self, notification: &Notification) -> Result<(), AlertError> {
    warn!("{}: {}", notification.title, notification.body);
    Ok(())
  }
}
