// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/config.rs - 用户设置与持久化
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

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{presence::DEFAULT_MIN_VISIBILITY, score::WeightProfile};

/// 偏差百分比与原始误差之间的换算系数
pub const DISPLAY_SCALE_FACTOR: f64 = 350.0;
pub const ALERT_COOLDOWN_MS: f64 = 3000.0;
pub const DEFAULT_THRESHOLD_PERCENT: u8 = 60;
pub const DEFAULT_ALERT_DELAY_SECONDS: u32 = 3;
pub const MAX_THRESHOLD_PERCENT: u8 = 100;
/// 姿势恢复时累计时间的衰减倍率
pub const DECAY_RATE: f64 = 2.0;
/// 两帧间隔超过该值（如标签页被挂起）时，本帧不计入累计时间
pub const MAX_FRAME_GAP_SECONDS: f64 = 5.0;

#[derive(Error, Debug)]
pub enum SettingsError {
  #[error("阈值超出范围: {0}（允许 0-100）")]
  ThresholdOutOfRange(u8),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("设置文件格式错误: {0}")]
  JsonError(#[from] serde_json::Error),
}

/// 用户可调的设置，字段名沿用持久化键名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
  #[serde(rename = "posture_threshold", default = "default_threshold")]
  pub threshold_percent: u8,
  #[serde(rename = "posture_delay", default = "default_delay")]
  pub alert_delay_seconds: u32,
  #[serde(default)]
  pub profile: WeightProfile,
}

fn default_threshold() -> u8 {
  DEFAULT_THRESHOLD_PERCENT
}

fn default_delay() -> u32 {
  DEFAULT_ALERT_DELAY_SECONDS
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      threshold_percent: DEFAULT_THRESHOLD_PERCENT,
      alert_delay_seconds: DEFAULT_ALERT_DELAY_SECONDS,
      profile: WeightProfile::default(),
    }
  }
}

impl Settings {
  /// 百分比换算成与 `final_error` 可比的阈值
  pub fn deviation_threshold(&self) -> f64 {
    self.threshold_percent as f64 / DISPLAY_SCALE_FACTOR
  }

  pub fn validate(&self) -> Result<(), SettingsError> {
    if self.threshold_percent > MAX_THRESHOLD_PERCENT {
      return Err(SettingsError::ThresholdOutOfRange(self.threshold_percent));
    }
    Ok(())
  }

  /// 应用部分更新；校验失败时原设置不变
  pub fn apply(&self, update: &ConfigUpdate) -> Result<Settings, SettingsError> {
    let next = Settings {
      threshold_percent: update.threshold_percent.unwrap_or(self.threshold_percent),
      alert_delay_seconds: update
        .alert_delay_seconds
        .unwrap_or(self.alert_delay_seconds),
      profile: update.profile.unwrap_or(self.profile),
    };
    next.validate()?;
    Ok(next)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
  #[serde(default)]
  pub threshold_percent: Option<u8>,
  #[serde(default)]
  pub alert_delay_seconds: Option<u32>,
  #[serde(default)]
  pub profile: Option<WeightProfile>,
}

impl ConfigUpdate {
  pub fn is_empty(&self) -> bool {
    self.threshold_percent.is_none() && self.alert_delay_seconds.is_none() && self.profile.is_none()
  }
}

/// 不对用户开放、但允许在嵌入时调整的常量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
  pub display_scale: f64,
  pub alert_cooldown_ms: f64,
  pub decay_rate: f64,
  pub max_frame_gap_seconds: f64,
  pub min_visibility: f64,
}

impl Default for MonitorConfig {
  fn default() -> Self {
    Self {
      display_scale: DISPLAY_SCALE_FACTOR,
      alert_cooldown_ms: ALERT_COOLDOWN_MS,
      decay_rate: DECAY_RATE,
      max_frame_gap_seconds: MAX_FRAME_GAP_SECONDS,
      min_visibility: DEFAULT_MIN_VISIBILITY,
    }
  }
}

/// JSON 文件形式的设置存储
#[derive(Debug, Clone)]
pub struct SettingsStore {
  path: PathBuf,
}

impl SettingsStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// 读取设置；文件不存在时返回默认值
  pub fn load(&self) -> Result<Settings, SettingsError> {
    let content = match std::fs::read_to_string(&self.path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        info!("设置文件不存在，使用默认设置: {}", self.path.display());
        return Ok(Settings::default());
      }
      Err(e) => return Err(e.into()),
    };

    let settings: Settings = serde_json::from_str(&content)?;
    if let Err(e) = settings.validate() {
      warn!("设置文件中的值无效: {}", e);
      return Err(e);
    }
    debug!("已读取设置: {:?}", settings);
    Ok(settings)
  }

  pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
    settings.validate()?;
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(&self.path, content)?;
    debug!("设置已写入: {}", self.path.display());
    Ok(())
  }

  pub fn update(&self, update: &ConfigUpdate) -> Result<Settings, SettingsError> {
    let next = self.load()?.apply(update)?;
    self.save(&next)?;
    Ok(next)
  }
}
