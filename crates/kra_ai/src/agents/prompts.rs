pub fn planner_prompt(question: &str, history_context: &str) -> String {
    let history = if history_context.trim().is_empty() {
        "(no previous turns)".to_string()
    } else {
        history_context.trim_end().to_string()
    };
    format!(
        r#"You are a planning agent that decides how to answer research questions about scientific papers.

Produce a small list of tasks for downstream agents.

Available task types:
- "retrieval": retrieve relevant chunks from the paper corpus.
- "evidence": extract structured evidence from the retrieved chunks.
- "answer": compose the final answer from structured evidence.

Rules:
1) For most research questions emit, in order: "retrieval", "evidence", "answer".
2) The retrieval query may be rewritten to be self-contained using the conversation history.
3) If the question is clearly unanswerable or off-topic, return an empty task list.

Conversation history (most recent last):
{history}

Question:
{question}

Output:
Return ONLY JSON of the form {{"tasks": [{{"task_type": "<retrieval|evidence|answer>", "query": "<string>"}}]}}
"#
    )
}

pub fn evidence_prompt(question: &str, context_block: &str) -> String {
    format!(
        r#"You are an evidence extraction assistant.

Research question:
{question}

Retrieved chunks (with metadata):
{context_block}

Rules (non-negotiable):
1) Use ONLY the chunks above. Do not invent facts.
2) Extract between 1 and 5 concise claims that answer the question.
3) For each claim give ONE supporting sentence copied or minimally edited from the chunk text.
4) Copy paper_id, chunk_index and source exactly from the chunk header.
5) If the chunks do not contain enough information, return an empty "items" list.

Output:
Return ONLY JSON of the form
{{"question": "<the original question>", "items": [{{"claim": "...", "evidence_sentence": "...", "paper_id": "...", "chunk_index": 0, "source": "..."}}]}}
"#
    )
}

pub fn answer_prompt(question: &str, evidence_block: &str) -> String {
    format!(
        r#"You are a scientific answering assistant.

Research question:
{question}

Structured evidence items:
{evidence_block}

Rules (non-negotiable):
1) Answer STRICTLY from the evidence items. Do not invent facts.
2) Support every statement with citation markers [C1], [C2], ... referring to the items above.
3) If the evidence is insufficient or incomplete, say so explicitly.
4) Combine related claims and make the logical connection explicit; do not over-claim.

Output:
- The answer in plain prose with inline citations.
- Then a short "Evidence" section listing each cited item as:
  [Cn] <evidence_sentence> (paper_id=..., chunk_index=..., source=...)
"#
    )
}
