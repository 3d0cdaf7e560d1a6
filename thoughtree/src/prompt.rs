//! Prompt templates for the three oracle calls, in English and Japanese.
//!
//! - sample: one chain-of-thought continuation;
//! - propose: `n` next thoughts as a fenced JSON list of strings;
//! - check: classification keyword on the first line, justification after it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::thought::ThoughtPath;

/// Prompt language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ja,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ja" | "japanese" => Ok(Self::Ja),
            _ => Err(format!("unknown language: {} (use en or ja)", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::En => "en",
            Self::Ja => "ja",
        })
    }
}

const SAMPLE_EN_HEADER: &str =
    "You are an intelligent agent that is generating one thought at a time in\na tree of thoughts setting.";
const SAMPLE_JA_HEADER: &str =
    "あなたは、思考ツリーの設定で思考を1つずつ生成するインテリジェントなエージェントです。";
const SAMPLE_EN_FOOTER: &str = "Let's think step by step. Output exactly one next thought.";
const SAMPLE_JA_FOOTER: &str = "ステップバイステップで考えてください。次の思考を1つだけ出力してください。";

const PROPOSE_EN_HEADER: &str = r#"You are an intelligent agent that is generating thoughts in a tree of
thoughts setting.

The output should be a markdown code snippet formatted as a JSON list of
strings, including the leading and trailing "```json" and "```":

```json
[
"<thought-1>",
"<thought-2>",
"<thought-3>"
]
```"#;

const PROPOSE_JA_HEADER: &str = r#"あなたは、Tree-of-Thought (ToT) で思考を生成するインテリジェントなエージェントです。

問題と、解決のための思考プロセス(VALID THOUGHTS)が確定しています。
出力は、先頭に "```json"、末尾に "```" を含む、JSON形式の文字列リストとしてマークダウンコードスニペットにフォーマットしてください。

出力例を示します。
```json
[
"<thought-1>",
"<thought-2>",
"<thought-3>"
]
```"#;

const PROPOSE_JA_GUIDELINES: &str = r#"ガイドライン：

簡単な問題などで候補が完全に同じになってもかまいません。
思考を生成するために、問題と前回の思考を注意深く分析してください。
思考は、問題解決に向けた明確なステップや洞察を提供するものでなければなりません。
思考がループしている場合は、直ちに気づいて修正してください。
各思考は簡潔にまとめ、問題に直接関連するようにしてください。
より少ない思考で問題を解決できるように最善を尽くしてください。"#;

const CHECK_EN: &str = r#"Given the following problem description and a series of thoughts, evaluate the validity of the last thought.
Answer with exactly one of [VALID_FINAL|VALID_INTERMEDIATE|INVALID] on the first line, then explain your reasoning from the second line on.

Problem Description:
{problem}

Thoughts:
{thoughts}

Guidelines:
- VALID_FINAL if the last thought is a valid final solution to the problem.
- VALID_INTERMEDIATE if the last thought is a valid intermediate step towards the solution.
- INVALID if the last thought is invalid or contradicts the problem description.

Evaluation:"#;

const CHECK_JA: &str = r#"次の Problem Description に示す問題を解決するための thoughts について、
[VALID_FINAL|VALID_INTERMEDIATE|INVALID]のどれか１つだけを選んで１行目に回答してください。
そして、選択した理由を2行目以降でできるだけ詳しく説明してください。

Problem Description: 解決するべき問題です。
{problem}

Thoughts: 解決の手続きについての思考です。
{thoughts}

正しい回答を選ぶために下記のガイドラインに従ってください。
- VALID_FINAL: 最終的な thoughts が問題の解決に最適であると確認したときに選びます。
- VALID_INTERMEDIATE: 最終的な thoughts が問題の解決に適しているが、解決には思考をさらに進める必要があるときに選びます。
- INVALID: 最終的な thoughts が問題を解決できないとき、内容がルールに違反していたとき、明らかな間違いがあり思考をやり直す必要があるときに選びます。

Evaluation:"#;

fn push_thoughts(out: &mut String, heading: &str, path: &ThoughtPath) {
    out.push_str(heading);
    out.push_str("\n\n");
    for t in path.iter() {
        out.push_str(t);
        out.push('\n');
    }
    out.push('\n');
}

/// Prompt asking for exactly one next thought.
pub fn sample_prompt(language: Language, problem: &str, path: &ThoughtPath) -> String {
    let (header, footer) = match language {
        Language::En => (SAMPLE_EN_HEADER, SAMPLE_EN_FOOTER),
        Language::Ja => (SAMPLE_JA_HEADER, SAMPLE_JA_FOOTER),
    };
    let mut out = format!("{}\n\nPROBLEM\n\n{}\n\n", header, problem.trim());
    if !path.is_empty() {
        push_thoughts(&mut out, "THOUGHTS", path);
    }
    out.push_str(footer);
    out
}

/// Prompt asking for `n` candidate next thoughts as a JSON list.
pub fn propose_prompt(language: Language, problem: &str, path: &ThoughtPath, n: usize) -> String {
    match language {
        Language::En => {
            let mut out = format!("{}\n\nPROBLEM\n\n{}\n\n", PROPOSE_EN_HEADER, problem.trim());
            if path.is_empty() {
                out.push_str(&format!(
                    "Possible next {} valid thoughts based on the PROBLEM:",
                    n
                ));
            } else {
                push_thoughts(&mut out, "VALID THOUGHTS", path);
                out.push_str(&format!(
                    "Possible next {} valid thoughts based on the last valid thought:",
                    n
                ));
            }
            out
        }
        Language::Ja => {
            let mut out = format!(
                "{}\n\n問題は以下の通りです。\nPROBLEM\n\n{}\n\n",
                PROPOSE_JA_HEADER,
                problem.trim()
            );
            if path.is_empty() {
                out.push_str(&format!(
                    "上記の PROBLEM を参考にして、次の {} 個の最新の思考を出力してください。",
                    n
                ));
            } else {
                push_thoughts(&mut out, "VALID THOUGHTS(思考)", path);
                out.push_str(&format!(
                    "上記の思考を参考にして、次の {} 個の最新の思考を出力してください。",
                    n
                ));
            }
            out.push_str("\n\n");
            out.push_str(PROPOSE_JA_GUIDELINES);
            out
        }
    }
}

/// Prompt asking the validity oracle to classify the last thought of `path`.
pub fn check_prompt(language: Language, problem: &str, path: &ThoughtPath) -> String {
    let template = match language {
        Language::En => CHECK_EN,
        Language::Ja => CHECK_JA,
    };
    // Both placeholders are filled from the template text only, never from inserted text.
    let (head, tail) = template.split_once("{thoughts}").unwrap_or((template, ""));
    let mut out = head.replace("{problem}", problem.trim());
    out.push_str(&path.as_slice().join("\n"));
    out.push_str(tail);
    out
}
