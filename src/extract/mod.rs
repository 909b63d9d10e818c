//! フィールド抽出モジュール
//!
//! レスポンス本文に名前付きクエリテーブルを適用して1レコードを作る。
//! 対象サイトの構造が変わった場合はクエリテーブル（既定値は
//! `tracking::profiles`、上書きは設定ファイル）だけを直せばよい。

mod path;
mod query;

pub use path::NodePath;
pub use query::{FieldQuery, FieldSpec, Pattern, QuerySpec, QueryTable};

/// 連続する空白を1つにまとめて前後を削る
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 複数行の一致をカンマ区切り1文字列にまとめ、`/` を `-` に置換する
pub fn flatten_lines(lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }
    Some(lines.join(", ").replace('/', "-"))
}
