//! 主控台文字編解碼模組
//!
//! 遊戲主控台以 UTF-8 傳送文字，但伺服器日誌偶爾會夾帶無效位元組，
//! 解碼時一律以 U+FFFD 取代，不讓單一壞字元中斷整個 Session。

use encoding_rs::UTF_8;

/// 將主控台送來的一行位元組解碼為字串，並移除行尾的 CR/LF
///
/// # Example
/// ```
/// use gamecore::encoding::decode_console_line;
///
/// assert_eq!(decode_console_line(b"Day 14, 14:32\r\n"), "Day 14, 14:32");
/// ```
pub fn decode_console_line(bytes: &[u8]) -> String {
    let (decoded, _had_errors) = UTF_8.decode_with_bom_removal(bytes);
    decoded.trim_end_matches(&['\r', '\n'][..]).to_string()
}

/// 將文字編碼為送往主控台的一行（加上 CRLF）
pub fn encode_console_line(text: &str) -> Vec<u8> {
    let (encoded, _, _) = UTF_8.encode(text);
    let mut data = encoded.into_owned();
    data.extend_from_slice(b"\r\n");
    data
}
