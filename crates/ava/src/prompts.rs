//! Prompt templates for the action handlers and the general chat.

use crate::processing::Table;

pub const WELCOME_MESSAGE: &str = "**👋 Hi!**\n\nI'm **Ava** and can help you with lots of different tasks.\nI can help you find answers, get content from documents or webpages, summarise content and much more.\n\nI have a **Chat Model** for when we're chatting and an **Action Model** that runs actions.\nAn action runs when you pick one of the numbered buttons below a message.\n\n**Just ask me a question or upload a file to get started!**";

pub const CHAT_SYSTEM_PROMPT: &str = r#"You are Ava, a helpful assistant for a media agency that helps clients plan and execute their marketing plans.

You have tools for maths, image search, wikipedia, web search, news, movies and TV, YouTube videos, maps and music. Call a tool when the question needs fresh or factual information one of them provides; otherwise answer directly and concisely in markdown."#;

const ASSISTANT_PREAMBLE: &str = "Act as a world class assistant. Your job is to read content and provide a high quality summary using the following context, criteria and instructions.

## Context
We are a media agency that helps clients plan and execute their marketing plans.";

pub const NO_QUOTES: &str = "There are no quotes in this text";

fn content_prompt(approach: &str, response_format: &str, content: &str) -> String {
    format!(
        "{preamble}\n\n## Approach\n{approach}\n\n## Response Format\n{format}\n\n## Instructions\nReview the following content and return a high quality summary.\n\n```\n{content}\n```",
        preamble = ASSISTANT_PREAMBLE,
        approach = approach,
        format = response_format,
        content = content
    )
}

pub fn summary(content: &str) -> String {
    content_prompt(
        "Write a long form, detailed summary and don't leave out any information. Write this as if you're writing revision notes, so that the reader can learn all the details in the content.",
        "- Multi paragraph, long form, detailed summary covering all the details\n- Include a bullet point summary of all the important talking points covered after the summary\n- Always start your answer with '**Here is your summary**:'",
        content,
    )
}

pub fn bulletpoint_summary(content: &str) -> String {
    content_prompt(
        "Use the Inverted Pyramid method to create your summary. This method involves structuring the summary with the most important information at the beginning and gradually decreasing in importance as the summary progresses. The reader gets the key points and main takeaways immediately, and less critical details are provided afterward.",
        "- Concise bullet points\n- Always start your answer with '**Here is your summary**:'",
        content,
    )
}

pub fn themes(content: &str) -> String {
    content_prompt(
        "Create a list of the main themes covered in the content and add detailed bulletpoints where relevant.",
        "- Concise bullet points\n- Always start your answer with '**Here are the themes**:'",
        content,
    )
}

pub fn quotes(content: &str) -> String {
    format!(
        "Create a bulletpoint list of any quotes that are in this text. If there aren't any quotes then just respond with '{}':\n{}",
        NO_QUOTES, content
    )
}

pub fn question(context: &str, question: &str) -> String {
    format!(
        "Answer the question using only the content below. If the content does not contain the answer, say so.\n\n## Content\n```\n{}\n```\n\n## Question\n{}",
        context, question
    )
}

/// Metadata block plus JSON records for the data-insights prompt.
pub fn insights(table: &Table) -> String {
    let data_types = table
        .column_types()
        .iter()
        .map(|(name, ty)| format!("{}: {}", name, ty.name()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Based on the provided data, please analyze and provide insights regarding patterns, anomalies, and key findings. Structure your response as a bulletpoint list as follows:
'''
**Data Description:**
Describe the data in a paragraph
**Patterns:**
-
-
**Anomalies:**
-
-
**Key Findings:**
-
-
'''

Metadata:
- Number of rows: {rows}
- Number of columns: {columns}
- Column names: {names}
- Data types: {types}

Data:
{data}"#,
        rows = table.row_count(),
        columns = table.column_count(),
        names = table.column_names().join(", "),
        types = data_types,
        data = table.to_json_records()
    )
}
