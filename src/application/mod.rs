// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 作业上下文与各作业类型的处理函数，业务逻辑只通过领域层的特质访问存储和平台
pub mod context;
pub mod jobs;
