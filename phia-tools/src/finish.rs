use phia_core::{Tool, ToolError, ToolInput, ToolKind};

/// Hands its argument back unchanged; the controller treats the call as the
/// final answer.
///
/// Unquoted prose such as `finish(Hello, world)` arrives split at its commas,
/// so several positional arguments are joined back together. `answer=` is
/// accepted when no positional argument is given.
#[derive(Clone, Debug, Default)]
pub struct FinishTool;

#[async_trait::async_trait]
impl Tool for FinishTool {
    fn name(&self) -> &str {
        "finish"
    }

    fn description(&self) -> &str {
        "Returns the final answer."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Finish
    }

    async fn invoke(&self, input: &ToolInput) -> Result<String, ToolError> {
        if !input.args.is_empty() {
            return Ok(input.args.join(", "));
        }
        input
            .kwargs
            .get("answer")
            .cloned()
            .ok_or_else(|| ToolError::InvalidInput("finish expects the answer as its argument".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn input(args: &[&str], kwargs: &[(&str, &str)]) -> ToolInput {
        ToolInput {
            args: args.iter().map(|arg| arg.to_string()).collect(),
            kwargs: kwargs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[tokio::test]
    async fn returns_single_argument_unchanged() {
        let answer = FinishTool.invoke(&input(&["4"], &[])).await.unwrap();
        assert_eq!(answer, "4");
    }

    #[tokio::test]
    async fn rejoins_prose_split_at_commas() {
        let answer = FinishTool
            .invoke(&input(&["Hello", "world"], &[]))
            .await
            .unwrap();
        assert_eq!(answer, "Hello, world");
    }

    #[tokio::test]
    async fn accepts_answer_keyword() {
        let answer = FinishTool
            .invoke(&input(&[], &[("answer", "4")]))
            .await
            .unwrap();
        assert_eq!(answer, "4");
    }

    #[tokio::test]
    async fn rejects_missing_answer() {
        let err = FinishTool.invoke(&input(&[], &[])).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput(_)));
    }
}
