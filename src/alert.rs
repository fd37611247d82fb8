// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/alert.rs - 提醒分发
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

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{monitor::FrameOutcome, score::Cause};

pub const NOTIFICATION_TAG: &str = "posture-alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
  Granted,
  Denied,
  #[default]
  Undetermined,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的通知权限: {0}（可选 granted / denied / undetermined）")]
pub struct UnknownPermission(pub String);

impl NotificationPermission {
  pub fn name(self) -> &'static str {
    match self {
      NotificationPermission::Granted => "granted",
      NotificationPermission::Denied => "denied",
      NotificationPermission::Undetermined => "undetermined",
    }
  }
}

impl FromStr for NotificationPermission {
  type Err = UnknownPermission;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "granted" => Ok(NotificationPermission::Granted),
      "denied" => Ok(NotificationPermission::Denied),
      "undetermined" => Ok(NotificationPermission::Undetermined),
      _ => Err(UnknownPermission(s.to_string())),
    }
  }
}

impl std::fmt::Display for NotificationPermission {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// 提醒时的外部环境
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertEnvironment {
  /// 页面/窗口是否在前台
  pub foreground: bool,
  pub permission: NotificationPermission,
}

impl Default for AlertEnvironment {
  fn default() -> Self {
    Self {
      foreground: true,
      permission: NotificationPermission::Undetermined,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
  Sine,
  Triangle,
}

/// 提示音：频率从 `start_hz` 指数滑到 `end_hz`，音量从 `start_gain` 衰减到 `end_gain`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeepTone {
  pub waveform: Waveform,
  pub start_hz: f64,
  pub end_hz: f64,
  pub sweep_seconds: f64,
  pub start_gain: f64,
  pub end_gain: f64,
  pub duration_seconds: f64,
}

pub const ALERT_BEEP: BeepTone = BeepTone {
  waveform: Waveform::Triangle,
  start_hz: 440.0,
  end_hz: 880.0,
  sweep_seconds: 0.1,
  start_gain: 0.1,
  end_gain: 0.01,
  duration_seconds: 0.5,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title: String,
  pub body: String,
  pub tag: &'static str,
  /// 由提示音负责声音，通知本身静音
  pub silent: bool,
  pub require_interaction: bool,
}

impl Notification {
  pub fn posture_alert(cause: Cause) -> Self {
    let body = match cause {
      Cause::Slouching => "姿势不正！请坐端正。",
      Cause::TooClose => "离屏幕太近了，注意乌龟颈！",
      Cause::TooFar => "离屏幕太远了，请坐回原位。",
    };
    Self {
      title: "⚠️ 姿势提醒".to_string(),
      body: body.to_string(),
      tag: NOTIFICATION_TAG,
      silent: true,
      require_interaction: false,
    }
  }

  pub fn test() -> Self {
    Self {
      title: "🔔 通知测试".to_string(),
      body: "能看到这条通知吗？".to_string(),
      tag: NOTIFICATION_TAG,
      silent: false,
      require_interaction: true,
    }
  }
}

#[derive(Error, Debug)]
pub enum AlertError {
  #[error("通知权限被拒绝")]
  NotificationDenied,
  #[error("通知不可用: {0}")]
  NotificationUnavailable(String),
  #[error("音频输出失败: {0}")]
  AudioUnavailable(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
}

/// 实际执行提醒效果的一方（终端、桌面、测试替身……）
pub trait AlertSink {
  fn set_overlay(&mut self, active: bool);
  fn play_beep(&mut self, tone: &BeepTone) -> Result<(), AlertError>;
  fn flash_title(&mut self, now_ms: f64);
  fn notify(&mut self, notification: &Notification) -> Result<(), AlertError>;
  /// 每帧调用一次，用于推进标题闪烁之类的定时效果
  fn tick(&mut self, _now_ms: f64) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertChannel {
  Overlay,
  Audio,
  Title,
  Notification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationStatus {
  #[default]
  NotAttempted,
  Sent,
  Denied,
  /// 权限未确定，需要向用户申请
  PermissionRequired,
  Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DispatchReport {
  pub overlay: bool,
  pub fired: Vec<AlertChannel>,
  pub failed: Vec<AlertChannel>,
  pub notification: NotificationStatus,
}

impl DispatchReport {
  pub fn fired(&self, channel: AlertChannel) -> bool {
    self.fired.contains(&channel)
  }
}

/// 把状态机结果转换成提醒效果；冷却由状态机的 `should_alert` 决定
pub struct AlertDispatcher<S> {
  sink: S,
  environment: AlertEnvironment,
  overlay_active: bool,
}

impl<S: AlertSink> AlertDispatcher<S> {
  pub fn new(sink: S) -> Self {
    Self::with_environment(sink, AlertEnvironment::default())
  }

  pub fn with_environment(sink: S, environment: AlertEnvironment) -> Self {
    Self {
      sink,
      environment,
      overlay_active: false,
    }
  }

  pub fn environment(&self) -> &AlertEnvironment {
    &self.environment
  }

  pub fn set_foreground(&mut self, foreground: bool) {
    self.environment.foreground = foreground;
  }

  pub fn set_permission(&mut self, permission: NotificationPermission) {
    info!("通知权限: {:?}", permission);
    self.environment.permission = permission;
  }

  pub fn sink(&self) -> &S {
    &self.sink
  }

  pub fn sink_mut(&mut self) -> &mut S {
    &mut self.sink
  }

  pub fn into_sink(self) -> S {
    self.sink
  }

  pub fn dispatch(&mut self, outcome: &FrameOutcome) -> DispatchReport {
    self.sink.tick(outcome.timestamp_ms);
    let mut report = DispatchReport {
      overlay: outcome.overlay,
      ..Default::default()
    };

    if outcome.overlay {
      self.sink.set_overlay(true);
      self.overlay_active = true;
      report.fired.push(AlertChannel::Overlay);
    } else if self.overlay_active {
      self.clear();
    }

    if outcome.should_alert {
      let cause = outcome
        .deviation
        .map(|d| d.cause())
        .unwrap_or(Cause::Slouching);
      info!("触发姿势提醒: {:?}", cause);

      self.beep(&mut report);
      if !self.environment.foreground {
        self.sink.flash_title(outcome.timestamp_ms);
        report.fired.push(AlertChannel::Title);
      }
      self.notify(&Notification::posture_alert(cause), &mut report);
    }

    report
  }

  /// 手动测试各个提醒通道，不受冷却限制
  pub fn test_alert(&mut self, now_ms: f64) -> DispatchReport {
    let mut report = DispatchReport {
      overlay: self.overlay_active,
      ..Default::default()
    };
    self.sink.flash_title(now_ms);
    report.fired.push(AlertChannel::Title);
    self.beep(&mut report);
    self.notify(&Notification::test(), &mut report);
    match report.notification {
      NotificationStatus::Denied => warn!("通知权限处于拒绝状态，请在系统设置中允许通知"),
      NotificationStatus::PermissionRequired => info!("尚未获得通知权限，需要先向用户申请"),
      _ => {}
    }
    report
  }

  /// 立即关闭视觉遮罩
  pub fn clear(&mut self) {
    self.sink.set_overlay(false);
    self.overlay_active = false;
  }

  fn beep(&mut self, report: &mut DispatchReport) {
    match self.sink.play_beep(&ALERT_BEEP) {
      Ok(()) => report.fired.push(AlertChannel::Audio),
      Err(e) => {
        warn!("提示音播放失败: {}", e);
        report.failed.push(AlertChannel::Audio);
      }
    }
  }

  fn notify(&mut self, notification: &Notification, report: &mut DispatchReport) {
    report.notification = match self.environment.permission {
      NotificationPermission::Granted => match self.sink.notify(notification) {
        Ok(()) => {
          report.fired.push(AlertChannel::Notification);
          NotificationStatus::Sent
        }
        Err(e) => {
          warn!("系统通知发送失败: {}", e);
          report.failed.push(AlertChannel::Notification);
          NotificationStatus::Failed
        }
      },
      NotificationPermission::Denied => {
        debug!("通知权限被拒绝，跳过系统通知");
        NotificationStatus::Denied
      }
      NotificationPermission::Undetermined => {
        debug!("通知权限未确定，跳过系统通知");
        NotificationStatus::PermissionRequired
      }
    };
  }
}
