//! Telnet 命令位元組過濾
//!
//! 遊戲主控台幾乎不做選項協商，但行內仍可能夾帶 IAC 序列。
//! 這裡只負責把它們從文字中剔除，不回應任何協商。

/// Telnet IAC (Interpret As Command) - 0xFF
pub const IAC: u8 = 255;

const SE: u8 = 240;
const SB: u8 = 250;
const WILL: u8 = 251;
const WONT: u8 = 252;
const DO: u8 = 253;
const DONT: u8 = 254;

/// 被剔除的選項協商（WILL/WONT/DO/DONT + 選項），僅供除錯紀錄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiation {
    pub command: u8,
    pub option: u8,
}

/// 從一行原始位元組中移除 Telnet 命令序列
///
/// 回傳 (純文字位元組, 被剔除的協商)。`IAC IAC` 還原為單一 0xFF，
/// 子協商 (`IAC SB ... IAC SE`) 整段丟棄，行尾不完整的 IAC 直接截斷。
pub fn strip_iac(input: &[u8]) -> (Vec<u8>, Vec<Negotiation>) {
    let mut data = Vec::with_capacity(input.len());
    let mut negotiations = Vec::new();
    let mut i = 0;

    while i < input.len() {
        if input[i] != IAC {
            data.push(input[i]);
            i += 1;
            continue;
        }

        match input.get(i + 1).copied() {
            None => break,
            Some(IAC) => {
                data.push(IAC);
                i += 2;
            }
            Some(command @ (WILL | WONT | DO | DONT)) => {
                if let Some(&option) = input.get(i + 2) {
                    negotiations.push(Negotiation { command, option });
                }
                i += 3;
            }
            Some(SB) => {
                let mut j = i + 2;
                while j + 1 < input.len() && !(input[j] == IAC && input[j + 1] == SE) {
                    j += 1;
                }
                i = j + 2;
            }
            Some(_) => i += 2,
        }
    }

    (data, negotiations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        let (data, negotiations) = strip_iac(b"Day 14, 14:32\r\n");
        assert_eq!(data, b"Day 14, 14:32\r\n");
        assert!(negotiations.is_empty());
    }

    #[test]
    fn test_escaped_iac() {
        let (data, _) = strip_iac(&[b'A', IAC, IAC, b'B']);
        assert_eq!(data, vec![b'A', IAC, b'B']);
    }

    #[test]
    fn test_negotiation_removed() {
        let mut input = vec![IAC, WILL, 1];
        input.extend_from_slice(b"Please enter password:\r\n");
        let (data, negotiations) = strip_iac(&input);
        assert_eq!(data, b"Please enter password:\r\n");
        assert_eq!(negotiations, vec![Negotiation { command: WILL, option: 1 }]);
    }

    #[test]
    fn test_subnegotiation_removed() {
        let input = [b'x', IAC, SB, 24, 1, IAC, SE, b'y'];
        let (data, negotiations) = strip_iac(&input);
        assert_eq!(data, b"xy");
        assert!(negotiations.is_empty());
    }

    #[test]
    fn test_truncated_iac() {
        let (data, _) = strip_iac(&[b'o', b'k', IAC]);
        assert_eq!(data, b"ok");
    }
}
