// SPDX-License-Identifier: GPL-2.0-or-later
pub(crate) mod clip;
pub(crate) mod status;
