// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/score.rs - 姿态偏差评分
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

use crate::{keypoint::Landmark, pose::NormalizedPose};

// 前倾 / 后仰判定
const FORWARD_LEAN_RATIO: f64 = 1.12;
const FORWARD_LEAN_COEFFICIENT: f64 = 3.0;
const BACKWARD_LEAN_RATIO: f64 = 0.85;
const BACKWARD_LEAN_COEFFICIENT: f64 = 1.5;

/// 远近惩罚超过该值时，认为主要原因是离屏幕距离变化
const SCALE_CAUSE_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisWeights {
  pub x: f64,
  pub y: f64,
  pub z: f64,
}

impl AxisWeights {
  pub const fn new(x: f64, y: f64, z: f64) -> Self {
    Self { x, y, z }
  }
}

/// 权重方案
///
/// - `Depth`: 使用 x/y/z 三个轴
/// - `Planar`: 只使用图像平面内的 x/y，忽略检测器给出的深度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightProfile {
  #[default]
  Depth,
  Planar,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("未知的权重方案: {0}（可选 depth / planar）")]
pub struct UnknownProfile(pub String);

impl WeightProfile {
  pub fn name(self) -> &'static str {
    match self {
      WeightProfile::Depth => "depth",
      WeightProfile::Planar => "planar",
    }
  }

  pub fn weights(self) -> WeightTable {
    match self {
      WeightProfile::Depth => WeightTable::depth(),
      WeightProfile::Planar => WeightTable::planar(),
    }
  }
}

impl FromStr for WeightProfile {
  type Err = UnknownProfile;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "depth" => Ok(WeightProfile::Depth),
      "planar" => Ok(WeightProfile::Planar),
      _ => Err(UnknownProfile(s.to_string())),
    }
  }
}

impl std::fmt::Display for WeightProfile {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.name())
  }
}

/// 每个关键点的分轴权重
///
/// 头部关键点 x 权重很低（转头不算坏姿势），y/z 权重高（低头、探头）；
/// 肩部 x/y 适中，z 较低。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightTable {
  weights: [AxisWeights; 7],
}

impl WeightTable {
  pub fn depth() -> Self {
    let mut weights = [AxisWeights::new(0.0, 0.0, 0.0); 7];
    weights[Landmark::Nose.slot()] = AxisWeights::new(0.2, 1.2, 1.5);
    weights[Landmark::LeftEye.slot()] = AxisWeights::new(0.2, 1.2, 1.2);
    weights[Landmark::RightEye.slot()] = AxisWeights::new(0.2, 1.2, 1.2);
    weights[Landmark::LeftEar.slot()] = AxisWeights::new(0.2, 1.2, 1.0);
    weights[Landmark::RightEar.slot()] = AxisWeights::new(0.2, 1.2, 1.0);
    weights[Landmark::LeftShoulder.slot()] = AxisWeights::new(0.8, 1.0, 0.5);
    weights[Landmark::RightShoulder.slot()] = AxisWeights::new(0.8, 1.0, 0.5);
    Self { weights }
  }

  pub fn planar() -> Self {
    let mut table = Self::depth();
    for w in table.weights.iter_mut() {
      w.z = 0.0;
    }
    table
  }

  pub fn get(&self, landmark: Landmark) -> AxisWeights {
    self.weights[landmark.slot()]
  }

  pub fn with(mut self, landmark: Landmark, weights: AxisWeights) -> Self {
    self.weights[landmark.slot()] = weights;
    self
  }
}

impl Default for WeightTable {
  fn default() -> Self {
    Self::depth()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lean {
  #[default]
  None,
  Forward,
  Backward,
}

/// 肩宽比例的线性惩罚
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeanPenalty {
  pub forward_ratio: f64,
  pub forward_coefficient: f64,
  pub backward_ratio: f64,
  pub backward_coefficient: f64,
}

impl Default for LeanPenalty {
  fn default() -> Self {
    Self {
      forward_ratio: FORWARD_LEAN_RATIO,
      forward_coefficient: FORWARD_LEAN_COEFFICIENT,
      backward_ratio: BACKWARD_LEAN_RATIO,
      backward_coefficient: BACKWARD_LEAN_COEFFICIENT,
    }
  }
}

impl LeanPenalty {
  pub fn evaluate(&self, scale_ratio: f64) -> (Lean, f64) {
    if scale_ratio > self.forward_ratio {
      (
        Lean::Forward,
        (scale_ratio - self.forward_ratio) * self.forward_coefficient,
      )
    } else if scale_ratio < self.backward_ratio {
      (
        Lean::Backward,
        (self.backward_ratio - scale_ratio) * self.backward_coefficient,
      )
    } else {
      (Lean::None, 0.0)
    }
  }
}

/// 坏姿势的主要原因（用于状态文字）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
  Slouching,
  TooClose,
  TooFar,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Deviation {
  pub base_error: f64,
  pub scale_error: f64,
  pub final_error: f64,
  pub scale_ratio: f64,
  pub lean: Lean,
}

impl Deviation {
  pub fn percent(&self, display_scale: f64) -> u8 {
    deviation_percent(self.final_error, display_scale)
  }

  pub fn cause(&self) -> Cause {
    if self.scale_error > SCALE_CAUSE_THRESHOLD {
      match self.lean {
        Lean::Backward => Cause::TooFar,
        _ => Cause::TooClose,
      }
    } else {
      Cause::Slouching
    }
  }
}

/// 界面显示用的百分比，封顶 100
pub fn deviation_percent(final_error: f64, display_scale: f64) -> u8 {
  let percent = (final_error * display_scale).round();
  if percent.is_nan() {
    return 0;
  }
  percent.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scorer {
  weights: WeightTable,
  lean: LeanPenalty,
}

impl Scorer {
  pub fn new(profile: WeightProfile) -> Self {
    Self {
      weights: profile.weights(),
      lean: LeanPenalty::default(),
    }
  }

  pub fn with_weights(mut self, weights: WeightTable) -> Self {
    self.weights = weights;
    self
  }

  pub fn with_lean(mut self, lean: LeanPenalty) -> Self {
    self.lean = lean;
    self
  }

  pub fn weights(&self) -> &WeightTable {
    &self.weights
  }

  pub fn score(&self, current: &NormalizedPose, reference: &NormalizedPose) -> Deviation {
    let mut total = 0.0;
    for landmark in Landmark::TRACKED {
      let p = current.point(landmark);
      let r = reference.point(landmark);
      let w = self.weights.get(landmark);

      let dx = (p.x - r.x).abs() * w.x;
      let dy = (p.y - r.y).abs() * w.y;
      let dz = (p.z - r.z).abs() * w.z;
      total += (dx * dx + dy * dy + dz * dz).sqrt();
    }
    let base_error = total / Landmark::TRACKED.len() as f64;

    let scale_ratio = current.shoulder_width() / reference.shoulder_width();
    let (lean, scale_error) = self.lean.evaluate(scale_ratio);

    Deviation {
      base_error,
      scale_error,
      final_error: base_error + scale_error,
      scale_ratio,
      lean,
    }
  }
}
