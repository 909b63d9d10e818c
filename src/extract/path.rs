//! 位置指定パス（XPath のサブセット）
//!
//! 対応する構文:
//! - `/name` 子要素、`//name` 子孫要素
//! - `name[n]` 同名兄弟のうち n 番目（1始まり）
//! - `*`, `*[n]` 任意の要素
//! - 末尾の `text()` / `//text()` テキストノード

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use scraper::{ElementRef, Html};

use super::normalize_ws;
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest {
    Name(String),
    Any,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    axis: Axis,
    test: NodeTest,
    position: Option<usize>,
}

impl Step {
    fn matches(&self, element: &ElementRef<'_>) -> bool {
        match &self.test {
            NodeTest::Any => true,
            NodeTest::Name(name) => element.value().name().eq_ignore_ascii_case(name),
        }
    }

    /// 兄弟グループに名前テストと位置述語を適用
    fn apply<'a>(&self, siblings: Vec<ElementRef<'a>>, out: &mut Vec<ElementRef<'a>>) {
        let matched = siblings
            .into_iter()
            .filter(|e| self.matches(e))
            .enumerate()
            .filter(|(i, _)| self.position.map_or(true, |p| i + 1 == p))
            .map(|(_, e)| e);

        for element in matched {
            if !out.contains(&element) {
                out.push(element);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    source: String,
    steps: Vec<Step>,
    text: Option<Axis>,
}

impl NodePath {
    pub fn parse(source: &str) -> Result<Self, ToolError> {
        let source = source.trim();
        let invalid = |why: &str| ToolError::Query(format!("{}: {}", why, source));

        if !source.starts_with('/') {
            return Err(invalid("パスは '/' で始まる必要があります"));
        }

        let mut steps = Vec::new();
        let mut text = None;
        let mut rest = source;

        while !rest.is_empty() {
            if text.is_some() {
                return Err(invalid("text() はパスの末尾にのみ置けます"));
            }

            let axis = if let Some(r) = rest.strip_prefix("//") {
                rest = r;
                Axis::Descendant
            } else if let Some(r) = rest.strip_prefix('/') {
                rest = r;
                Axis::Child
            } else {
                return Err(invalid("区切りが不正です"));
            };

            let end = rest.find('/').unwrap_or(rest.len());
            let segment = &rest[..end];
            rest = &rest[end..];

            if segment == "text()" {
                text = Some(axis);
                continue;
            }

            let (name, position) = match segment.find('[') {
                Some(open) => {
                    let inner = segment[open + 1..]
                        .strip_suffix(']')
                        .ok_or_else(|| invalid("述語が閉じていません"))?;
                    let position: usize = inner
                        .trim()
                        .parse()
                        .map_err(|_| invalid("位置述語は数値のみ対応しています"))?;
                    if position == 0 {
                        return Err(invalid("位置は1始まりです"));
                    }
                    (&segment[..open], Some(position))
                }
                None => (segment, None),
            };

            let test = match name {
                "*" => NodeTest::Any,
                n if !n.is_empty()
                    && n.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
                {
                    NodeTest::Name(n.to_ascii_lowercase())
                }
                _ => return Err(invalid("要素名が不正です")),
            };

            steps.push(Step {
                axis,
                test,
                position,
            });
        }

        if steps.is_empty() && text.is_none() {
            return Err(invalid("空のパスです"));
        }

        Ok(Self {
            source: source.to_string(),
            steps,
            text,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn select_elements<'a>(&self, doc: &'a Html) -> Vec<ElementRef<'a>> {
        let root = doc.root_element();
        let mut context: Option<Vec<ElementRef<'a>>> = None;

        for step in &self.steps {
            let mut groups: Vec<Vec<ElementRef<'a>>> = Vec::new();

            match (&context, step.axis) {
                // 文書ノードの子はルート要素のみ
                (None, Axis::Child) => groups.push(vec![root]),
                (None, Axis::Descendant) => {
                    groups.push(vec![root]);
                    for element in root.descendants().filter_map(ElementRef::wrap) {
                        groups.push(child_elements(element));
                    }
                }
                (Some(ctx), Axis::Child) => {
                    for element in ctx {
                        groups.push(child_elements(*element));
                    }
                }
                (Some(ctx), Axis::Descendant) => {
                    for element in ctx {
                        for d in element.descendants().filter_map(ElementRef::wrap) {
                            groups.push(child_elements(d));
                        }
                    }
                }
            }

            let mut next = Vec::new();
            for group in groups {
                step.apply(group, &mut next);
            }
            context = Some(next);
        }

        let mut selected = context.unwrap_or_else(|| vec![root]);
        sort_document_order(root, &mut selected);
        selected
    }

    /// 一致した各ノードのテキスト（文書順、空白正規化済み、空は除外）。
    /// 要素の場合は `<br>` ごとに1行とする
    pub fn select(&self, doc: &Html) -> Vec<String> {
        let elements = self.select_elements(doc);
        let at_document = self.steps.is_empty();

        let raw: Vec<String> = match self.text {
            None => elements.iter().flat_map(|e| element_lines(*e)).collect(),
            Some(axis) => {
                let mut lines = Vec::new();
                for element in &elements {
                    if axis == Axis::Descendant || at_document {
                        for node in element.descendants() {
                            if let Some(text) = node.value().as_text() {
                                lines.push(text.to_string());
                            }
                        }
                    } else {
                        for node in element.children() {
                            if let Some(text) = node.value().as_text() {
                                lines.push(text.to_string());
                            }
                        }
                    }
                }
                lines
            }
        };

        raw.iter()
            .map(|s| normalize_ws(s))
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn child_elements(element: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

/// 要素内のテキストを `<br>` で区切った行
fn element_lines(element: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for node in element.descendants() {
        if let Some(text) = node.value().as_text() {
            current.push_str(text);
            current.push(' ');
        } else if node
            .value()
            .as_element()
            .map_or(false, |e| e.name().eq_ignore_ascii_case("br"))
        {
            lines.push(std::mem::take(&mut current));
        }
    }
    lines.push(current);
    lines
}

/// 先行順（文書順）に並べ替える
fn sort_document_order<'a>(root: ElementRef<'a>, elements: &mut [ElementRef<'a>]) {
    if elements.len() < 2 {
        return;
    }
    let order: HashMap<_, usize> = root
        .descendants()
        .enumerate()
        .map(|(i, node)| (node.id(), i))
        .collect();
    elements.sort_by_key(|e| order.get(&e.id()).copied().unwrap_or(usize::MAX));
}

impl FromStr for NodePath {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}
