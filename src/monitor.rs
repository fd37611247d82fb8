// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/monitor.rs - 姿势状态机
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
use tracing::{debug, info, warn};

use crate::{
  config::{ConfigUpdate, MonitorConfig, Settings, SettingsError},
  keypoint::Keypoint,
  pose::{NormalizeError, NormalizedPose, normalize_slice},
  presence::PresenceFilter,
  score::{Deviation, Scorer},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostureState {
  /// 尚未设置基准姿势
  #[default]
  Idle,
  Good,
  /// 偏差超过阈值但还没到提醒延迟，或正在恢复
  Warning,
  /// 可以提醒
  Bad,
  /// 监测中但画面里没有人
  Away,
}

impl PostureState {
  pub fn is_monitoring(self) -> bool {
    !matches!(self, PostureState::Idle)
  }

  pub fn name(self) -> &'static str {
    match self {
      PostureState::Idle => "idle",
      PostureState::Good => "good",
      PostureState::Warning => "warning",
      PostureState::Bad => "bad",
      PostureState::Away => "away",
    }
  }
}

/// 本帧未更新状态的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSkip {
  Degenerate,
  OutOfOrder,
}

#[derive(Error, Debug)]
pub enum MonitorError {
  #[error("画面中没有检测到用户，无法设置基准姿势")]
  SubjectAbsent,
  #[error("基准帧无效: {0}")]
  DegenerateFrame(#[from] NormalizeError),
  #[error("设置错误: {0}")]
  Settings(#[from] SettingsError),
}

/// 每帧的判定结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameOutcome {
  pub timestamp_ms: f64,
  pub state: PostureState,
  pub deviation_percent: Option<u8>,
  pub deviation: Option<Deviation>,
  /// 本帧偏差是否超过阈值
  pub over_threshold: bool,
  /// 是否该触发一次提醒（已经过冷却判断）
  pub should_alert: bool,
  /// 视觉遮罩，只在 `Bad` 时打开
  pub overlay: bool,
  pub accumulated_seconds: f64,
  pub alert_delay_seconds: f64,
  pub skipped: Option<FrameSkip>,
}

impl FrameOutcome {
  fn bare(timestamp_ms: f64, state: PostureState, rules: &Rules) -> Self {
    Self {
      timestamp_ms,
      state,
      deviation_percent: None,
      deviation: None,
      over_threshold: false,
      should_alert: false,
      overlay: false,
      accumulated_seconds: 0.0,
      alert_delay_seconds: rules.delay_seconds,
      skipped: None,
    }
  }

  /// 距离触发提醒还剩多少秒（向上取整）
  pub fn remaining_seconds(&self) -> u32 {
    (self.alert_delay_seconds - self.accumulated_seconds)
      .ceil()
      .max(0.0) as u32
  }
}

/// 从设置与常量推导出的单帧判定规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rules {
  pub threshold: f64,
  pub delay_seconds: f64,
  pub decay_rate: f64,
  pub max_frame_gap_seconds: f64,
  pub cooldown_ms: f64,
  pub display_scale: f64,
  pub scorer: Scorer,
  pub presence: PresenceFilter,
}

impl Rules {
  pub fn new(settings: &Settings, config: &MonitorConfig) -> Self {
    Self {
      threshold: settings.deviation_threshold(),
      delay_seconds: settings.alert_delay_seconds as f64,
      decay_rate: config.decay_rate,
      max_frame_gap_seconds: config.max_frame_gap_seconds,
      cooldown_ms: config.alert_cooldown_ms,
      display_scale: config.display_scale,
      scorer: Scorer::new(settings.profile),
      presence: PresenceFilter::new(config.min_visibility),
    }
  }

  /// 与上一帧的间隔（秒），非正值或过大的间隔记为 0
  fn frame_delta(&self, last_ms: Option<f64>, now_ms: f64) -> f64 {
    let Some(last) = last_ms else {
      return 0.0;
    };
    let dt = (now_ms - last) / 1000.0;
    if dt <= 0.0 {
      0.0
    } else if dt > self.max_frame_gap_seconds {
      warn!("帧间隔过大 ({:.1}s)，本帧不计入累计时间", dt);
      0.0
    } else {
      dt
    }
  }
}

/// 一次监测会话的全部可变状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
  reference: Option<NormalizedPose>,
  accumulated_seconds: f64,
  /// 上一个计入时间的帧
  last_frame_ms: Option<f64>,
  /// 上一个按顺序到达的帧（包括离开期间），用于判定乱序
  last_seen_ms: Option<f64>,
  state: PostureState,
  last_alert_ms: Option<f64>,
}

impl Session {
  pub fn with_reference(reference: NormalizedPose) -> Self {
    Self {
      reference: Some(reference),
      state: PostureState::Good,
      ..Default::default()
    }
  }

  pub fn reference(&self) -> Option<&NormalizedPose> {
    self.reference.as_ref()
  }

  pub fn is_monitoring(&self) -> bool {
    self.reference.is_some()
  }

  pub fn state(&self) -> PostureState {
    self.state
  }

  pub fn is_bad_posture(&self) -> bool {
    self.state == PostureState::Bad
  }

  pub fn accumulated_seconds(&self) -> f64 {
    self.accumulated_seconds
  }

  pub fn last_frame_ms(&self) -> Option<f64> {
    self.last_frame_ms
  }

  pub fn last_seen_ms(&self) -> Option<f64> {
    self.last_seen_ms
  }

  pub fn last_alert_ms(&self) -> Option<f64> {
    self.last_alert_ms
  }

  /// 推进一帧，返回新的会话与本帧结果；`self` 不被修改
  pub fn advance(
    &self,
    rules: &Rules,
    landmarks: Option<&[Keypoint]>,
    timestamp_ms: f64,
  ) -> (Session, FrameOutcome) {
    let Some(reference) = self.reference.as_ref() else {
      return (
        self.clone(),
        FrameOutcome::bare(timestamp_ms, PostureState::Idle, rules),
      );
    };

    let out_of_order = !timestamp_ms.is_finite()
      || self.last_seen_ms.is_some_and(|last| timestamp_ms < last);
    if out_of_order {
      debug!("丢弃乱序帧: {}", timestamp_ms);
      return (self.clone(), self.retained(rules, timestamp_ms, FrameSkip::OutOfOrder));
    }

    let present = landmarks.is_some_and(|l| rules.presence.is_present(l));
    let Some(landmarks) = landmarks.filter(|_| present) else {
      let next = Session {
        accumulated_seconds: 0.0,
        last_frame_ms: None,
        last_seen_ms: Some(timestamp_ms),
        state: PostureState::Away,
        ..self.clone()
      };
      return (next, FrameOutcome::bare(timestamp_ms, PostureState::Away, rules));
    };

    let current = match normalize_slice(landmarks) {
      Ok(pose) => pose,
      Err(e) => {
        debug!("跳过退化帧: {}", e);
        return (self.clone(), self.retained(rules, timestamp_ms, FrameSkip::Degenerate));
      }
    };

    let deviation = rules.scorer.score(&current, reference);
    let dt = rules.frame_delta(self.last_frame_ms, timestamp_ms);
    let over_threshold = deviation.final_error > rules.threshold;

    let accumulated_seconds = if over_threshold {
      self.accumulated_seconds + dt
    } else {
      (self.accumulated_seconds - dt * rules.decay_rate).max(0.0)
    };

    let state = if over_threshold && accumulated_seconds >= rules.delay_seconds {
      PostureState::Bad
    } else if over_threshold || accumulated_seconds > 0.0 {
      PostureState::Warning
    } else {
      PostureState::Good
    };

    let should_alert = state == PostureState::Bad
      && self
        .last_alert_ms
        .is_none_or(|last| timestamp_ms - last > rules.cooldown_ms);

    let next = Session {
      reference: self.reference,
      accumulated_seconds,
      last_frame_ms: Some(timestamp_ms),
      last_seen_ms: Some(timestamp_ms),
      state,
      last_alert_ms: if should_alert {
        Some(timestamp_ms)
      } else {
        self.last_alert_ms
      },
    };

    let outcome = FrameOutcome {
      timestamp_ms,
      state,
      deviation_percent: Some(deviation.percent(rules.display_scale)),
      deviation: Some(deviation),
      over_threshold,
      should_alert,
      overlay: state == PostureState::Bad,
      accumulated_seconds,
      alert_delay_seconds: rules.delay_seconds,
      skipped: None,
    };

    (next, outcome)
  }

  /// 跳过本帧时沿用上一帧的状态
  fn retained(&self, rules: &Rules, timestamp_ms: f64, skip: FrameSkip) -> FrameOutcome {
    FrameOutcome {
      overlay: self.state == PostureState::Bad,
      accumulated_seconds: self.accumulated_seconds,
      skipped: Some(skip),
      ..FrameOutcome::bare(timestamp_ms, self.state, rules)
    }
  }
}

/// 持有设置、规则与会话的监测器
#[derive(Debug, Clone)]
pub struct PostureMonitor {
  settings: Settings,
  config: MonitorConfig,
  rules: Rules,
  session: Session,
}

impl PostureMonitor {
  pub fn new(settings: Settings) -> Self {
    Self::with_config(settings, MonitorConfig::default())
  }

  pub fn with_config(settings: Settings, config: MonitorConfig) -> Self {
    Self {
      rules: Rules::new(&settings, &config),
      settings,
      config,
      session: Session::default(),
    }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  pub fn rules(&self) -> &Rules {
    &self.rules
  }

  pub fn session(&self) -> &Session {
    &self.session
  }

  pub fn state(&self) -> PostureState {
    self.session.state()
  }

  /// 以当前帧作为基准姿势，开始（或重新开始）监测
  pub fn set_reference(&mut self, landmarks: &[Keypoint]) -> Result<(), MonitorError> {
    if !self.rules.presence.is_present(landmarks) {
      return Err(MonitorError::SubjectAbsent);
    }
    let reference = normalize_slice(landmarks)?;
    info!("基准姿势已设置，肩宽: {:.4}", reference.shoulder_width());
    self.session = Session::with_reference(reference);
    Ok(())
  }

  pub fn process_frame(&mut self, landmarks: Option<&[Keypoint]>, timestamp_ms: f64) -> FrameOutcome {
    let (next, outcome) = self.session.advance(&self.rules, landmarks, timestamp_ms);
    if next.state != self.session.state {
      debug!(
        "姿势状态: {} -> {}",
        self.session.state.name(),
        next.state.name()
      );
    }
    self.session = next;
    outcome
  }

  /// 更新用户设置，会话状态保留
  pub fn update_config(&mut self, update: &ConfigUpdate) -> Result<Settings, MonitorError> {
    let settings = self.settings.apply(update)?;
    info!(
      "设置已更新: 阈值 {}%, 延迟 {}s, 权重方案 {}",
      settings.threshold_percent, settings.alert_delay_seconds, settings.profile
    );
    self.settings = settings;
    self.rules = Rules::new(&self.settings, &self.config);
    Ok(settings)
  }

  /// 停止监测，清除全部会话状态
  pub fn stop(&mut self) {
    info!("停止监测");
    self.session = Session::default();
  }
}
