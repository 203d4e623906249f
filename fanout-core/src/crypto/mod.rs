// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod cipher;
pub mod encryption;

pub use cipher::{Cipher, MessageCipher};
pub use encryption::{decrypt, encrypt, CryptoError, SymmetricKey};
