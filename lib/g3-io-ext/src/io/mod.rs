/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

mod limited_read_until;
pub use limited_read_until::LimitedReadUntil;

mod write_all_flush;
pub use write_all_flush::WriteAllFlush;

mod ext;
pub use ext::{LimitedBufReadExt, LimitedWriteExt};
