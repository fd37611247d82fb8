// 该文件是 Duanzuo （端坐） 项目的一部分。
// src/frame.rs - 关键点帧定义
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

use crate::keypoint::Keypoint;

/// 检测器对一帧图像的输出
///
/// `landmarks` 为空表示检测器在这一帧里没有找到人。
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
  /// 调用方给出的时间戳（毫秒），只要求单调
  pub timestamp_ms: f64,
  #[serde(default)]
  pub landmarks: Option<Vec<Keypoint>>,
}

impl LandmarkFrame {
  pub fn new(timestamp_ms: f64, landmarks: Vec<Keypoint>) -> Self {
    Self {
      timestamp_ms,
      landmarks: Some(landmarks),
    }
  }

  pub fn empty(timestamp_ms: f64) -> Self {
    Self {
      timestamp_ms,
      landmarks: None,
    }
  }

  pub fn landmarks(&self) -> Option<&[Keypoint]> {
    self.landmarks.as_deref()
  }

  pub fn len(&self) -> usize {
    self.landmarks.as_ref().map_or(0, Vec::len)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
