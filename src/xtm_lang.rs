// Multi-language support module
// Localized UI strings for English and Chinese

use std::fmt::Display;

#[derive(Clone)]
pub struct Assets {
    pub board_title: &'static str,

    // Key hints on the top row
    pub hint_reveal: &'static str,
    pub hint_flag: &'static str,
    pub hint_new: &'static str,
    pub hint_exit: &'static str,

    // Bottom labels
    pub mines_fmt: &'static str, // "Mines: {}"
    pub flags_fmt: &'static str, // "Flags: {}"

    // Game over prompt
    pub game_over_title: &'static str,
    pub win_prompt: &'static str,
    pub loss_prompt: &'static str,
    pub btn_yes: &'static str,
    pub btn_no: &'static str,

    // Terminal size messages
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2: &'static str, // "Minimum size required: {}"
    pub tsmsg_title: &'static str,
}

/// Returns English language assets
pub fn english_assets() -> Assets {
    Assets {
        board_title: "Minesweeper",

        hint_reveal: "Reveal",
        hint_flag: "Flag",
        hint_new: "New",
        hint_exit: "Exit",

        mines_fmt: "Mines: {}",
        flags_fmt: "Flags: {}",

        game_over_title: "GAME OVER",
        win_prompt: "YOU WIN! PLAY AGAIN?",
        loss_prompt: "YOU LOSE! PLAY AGAIN?",
        btn_yes: " Yes ",
        btn_no: " No ",

        tsmsg_line1: "Terminal layout too small",
        tsmsg_line2: "Minimum size required: {}",
        tsmsg_title: "Resize needed",
    }
}

/// Returns Chinese language assets
pub fn chinese_assets() -> Assets {
    Assets {
        board_title: "扫雷",

        hint_reveal: "翻开",
        hint_flag: "标记",
        hint_new: "新游戏",
        hint_exit: "退出",

        mines_fmt: "地雷：{}",
        flags_fmt: "旗帜：{}",

        game_over_title: "游戏结束",
        win_prompt: "你赢了！再来一局？",
        loss_prompt: "你输了！再来一局？",
        btn_yes: " 是 ",
        btn_no: " 否 ",

        tsmsg_line1: "终端屏幕布局过小",
        tsmsg_line2: "最小需要尺寸：{}",
        tsmsg_title: "需要调整大小",
    }
}

/// Holds the current language code and active string assets
pub struct Lang {
    pub current_lang: String,
    pub assets: Assets,
}

impl Lang {
    /// Normalizes input (e.g., "zh-CN" → "zh") and defaults to English for unsupported languages
    pub fn new(lang_code: &str) -> Self {
        let code = if lang_code.to_lowercase().starts_with("zh") {
            "zh"
        } else {
            "en"
        };
        Lang {
            current_lang: code.to_string(),
            assets: if code == "zh" {
                chinese_assets()
            } else {
                english_assets()
            },
        }
    }
}

/// Substitute the first `{}` of a format string
pub fn fill(template: &str, value: impl Display) -> String {
    template.replacen("{}", &value.to_string(), 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_codes_are_normalized() {
        assert_eq!(Lang::new("zh-CN").current_lang, "zh");
        assert_eq!(Lang::new("ZH_tw").assets.btn_yes, " 是 ");
        assert_eq!(Lang::new("de").current_lang, "en");
        assert_eq!(Lang::new("").assets.win_prompt, "YOU WIN! PLAY AGAIN?");
    }

    #[test]
    fn fill_replaces_first_placeholder() {
        assert_eq!(fill(english_assets().mines_fmt, 12), "Mines: 12");
        assert_eq!(fill("{} x {}", "80"), "80 x {}");
    }
}
