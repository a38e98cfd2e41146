// ABOUTME: Pull progress records and their terminal-aware rendering.
// ABOUTME: Decodes newline-delimited JSON into per-layer bars or plain lines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::io::{self, IsTerminal, Write};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

const STATUS_TEMPLATE: &str = "{prefix}: {msg}";
const BAR_TEMPLATE: &str = "{prefix}: {msg} [{bar:40}] {bytes}/{total_bytes}";

/// One progress record, in the engine's JSON message format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(
        rename = "progressDetail",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_detail: Option<ProgressDetail>,

    #[serde(rename = "errorDetail", default, skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<ErrorDetail>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressMessage {
    pub fn status(id: Option<&str>, status: &str) -> Self {
        Self {
            id: id.map(str::to_string),
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    /// The error this record reports, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error_detail
            .as_ref()
            .and_then(|d| d.message.as_deref())
            .or(self.error.as_deref())
    }

    /// Encode as one JSON line, newline included.
    pub fn to_json_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    fn render(&self) -> String {
        let mut text = String::new();
        if let Some(ref id) = self.id {
            text.push_str(id);
            text.push_str(": ");
        }
        text.push_str(self.status.as_deref().unwrap_or_default());
        text
    }

    /// `(current, total)` when the record carries a known byte total.
    fn byte_progress(&self) -> Option<(u64, u64)> {
        let detail = self.progress_detail.as_ref()?;
        let total = u64::try_from(detail.total?).ok().filter(|t| *t > 0)?;
        let current = u64::try_from(detail.current?).unwrap_or(0).min(total);
        Some((current, total))
    }
}

/// Errors while consuming a progress stream.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("malformed progress record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("engine reported: {0}")]
    Remote(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Renders progress records to a writer.
///
/// With bars enabled each layer gets its own [`ProgressBar`] inside a
/// [`MultiProgress`], updated as its records arrive. Otherwise records are
/// printed one per line.
pub struct ProgressRenderer<W> {
    out: W,
    bars: Option<MultiProgress>,
    lines: HashMap<String, ProgressBar>,
}

impl ProgressRenderer<Box<dyn Write>> {
    /// Render to stderr, with layer bars when it is a terminal.
    pub fn stderr() -> Self {
        let terminal = io::stderr().is_terminal();
        Self::new(Box::new(io::stderr()), terminal)
    }

    /// Discard all progress.
    pub fn silent() -> Self {
        Self::new(Box::new(io::sink()), false)
    }
}

impl<W: Write> ProgressRenderer<W> {
    /// Plain lines to `out`, or layer bars on stderr when `terminal` is set.
    pub fn new(out: W, terminal: bool) -> Self {
        let bars = terminal.then(MultiProgress::new);
        Self {
            out,
            bars,
            lines: HashMap::new(),
        }
    }

    /// Layer bars drawn by `bars` instead of stderr.
    pub fn with_bars(out: W, bars: MultiProgress) -> Self {
        Self {
            out,
            bars: Some(bars),
            lines: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Drain a stream of JSON lines until EOF.
    pub async fn render_stream<R: AsyncRead + Unpin>(
        &mut self,
        reader: R,
    ) -> Result<(), RenderError> {
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines.next_line().await? {
            self.render_line(&line)?;
        }
        self.finish();
        Ok(())
    }

    /// Decode and render a single JSON line. Blank lines are ignored.
    pub fn render_line(&mut self, line: &str) -> Result<(), RenderError> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let message: ProgressMessage = serde_json::from_str(line)?;
        self.render(&message)
    }

    pub fn render(&mut self, message: &ProgressMessage) -> Result<(), RenderError> {
        if let Some(reason) = message.error_message() {
            return Err(RenderError::Remote(reason.to_string()));
        }

        let Some(bars) = &self.bars else {
            writeln!(self.out, "{}", message.render())?;
            self.out.flush()?;
            return Ok(());
        };

        let Some(ref id) = message.id else {
            bars.println(message.render())?;
            return Ok(());
        };

        let bar = self.lines.entry(id.clone()).or_insert_with(|| {
            let bar = bars.add(ProgressBar::no_length());
            bar.set_style(layer_style(STATUS_TEMPLATE));
            bar.set_prefix(id.clone());
            bar
        });

        if let Some((current, total)) = message.byte_progress() {
            if bar.length().is_none() {
                bar.set_style(layer_style(BAR_TEMPLATE));
            }
            bar.set_length(total);
            bar.set_position(current);
        }
        bar.set_message(message.status.clone().unwrap_or_default());
        Ok(())
    }

    /// Leave every layer bar drawn with its last status.
    pub fn finish(&mut self) {
        for bar in self.lines.values() {
            bar.finish();
        }
    }
}

fn layer_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indicatif::ProgressDrawTarget;

    fn plain() -> ProgressRenderer<Vec<u8>> {
        ProgressRenderer::new(Vec::new(), false)
    }

    fn output(renderer: ProgressRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn plain_mode_prints_one_line_per_record() {
        let mut renderer = plain();
        renderer
            .render_line(r#"{"status":"Pulling from library/alpine","id":"3.2"}"#)
            .unwrap();
        renderer
            .render_line(r#"{"status":"Downloading","id":"abc","progressDetail":{"current":5,"total":10}}"#)
            .unwrap();
        renderer.render_line("").unwrap();

        assert_eq!(
            output(renderer),
            "3.2: Pulling from library/alpine\nabc: Downloading\n"
        );
    }

    fn with_hidden_bars() -> ProgressRenderer<Vec<u8>> {
        ProgressRenderer::with_bars(
            Vec::new(),
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
        )
    }

    #[test]
    fn bars_mode_keeps_one_bar_per_layer() {
        let mut renderer = with_hidden_bars();
        renderer
            .render(&ProgressMessage::status(Some("aaa"), "Waiting"))
            .unwrap();
        renderer
            .render(&ProgressMessage::status(Some("bbb"), "Waiting"))
            .unwrap();
        renderer
            .render(&ProgressMessage::status(Some("aaa"), "Pull complete"))
            .unwrap();

        assert_eq!(renderer.lines.len(), 2);
        assert_eq!(renderer.lines["aaa"].message(), "Pull complete");
        assert_eq!(renderer.lines["bbb"].message(), "Waiting");
        assert!(renderer.into_inner().is_empty());
    }

    #[test]
    fn bars_mode_updates_the_right_layer_after_many_layers() {
        let mut renderer = with_hidden_bars();
        for n in 0..60 {
            let id = format!("layer-{}", n);
            renderer
                .render(&ProgressMessage::status(Some(&id), "Waiting"))
                .unwrap();
        }
        renderer
            .render(&ProgressMessage::status(Some("layer-0"), "Downloading"))
            .unwrap();

        assert_eq!(renderer.lines.len(), 60);
        assert_eq!(renderer.lines["layer-0"].message(), "Downloading");
        assert_eq!(renderer.lines["layer-36"].message(), "Waiting");
    }

    #[test]
    fn bars_mode_maps_progress_detail_to_length_and_position() {
        let mut renderer = with_hidden_bars();
        renderer
            .render_line(r#"{"status":"Downloading","id":"abc","progressDetail":{"current":1500,"total":3000}}"#)
            .unwrap();

        let bar = &renderer.lines["abc"];
        assert_eq!(bar.length(), Some(3000));
        assert_eq!(bar.position(), 1500);
        assert_eq!(bar.message(), "Downloading");
    }

    #[test]
    fn bars_mode_ignores_missing_or_zero_totals() {
        let mut renderer = with_hidden_bars();
        renderer
            .render_line(r#"{"status":"Waiting","id":"abc","progressDetail":{}}"#)
            .unwrap();
        renderer
            .render_line(r#"{"status":"Verifying","id":"abc","progressDetail":{"current":3,"total":0}}"#)
            .unwrap();

        assert_eq!(renderer.lines["abc"].length(), None);
        assert_eq!(renderer.lines["abc"].message(), "Verifying");
    }

    #[tokio::test]
    async fn bars_are_finished_at_end_of_stream() {
        let mut renderer = with_hidden_bars();
        renderer
            .render_stream(&b"{\"status\":\"Pulling fs layer\",\"id\":\"abc\"}\n{\"status\":\"Digest: sha256:00\"}\n"[..])
            .await
            .unwrap();

        assert!(renderer.lines["abc"].is_finished());
    }

    #[test]
    fn error_records_fail_rendering() {
        let mut renderer = plain();
        let err = renderer
            .render_line(r#"{"errorDetail":{"message":"manifest unknown"},"error":"manifest unknown"}"#)
            .unwrap_err();
        assert!(matches!(err, RenderError::Remote(ref m) if m == "manifest unknown"));
    }

    #[test]
    fn malformed_lines_fail_to_decode() {
        let mut renderer = plain();
        let err = renderer.render_line("{not json").unwrap_err();
        assert!(matches!(err, RenderError::Decode(_)));
    }

    #[test]
    fn json_line_round_trips_through_renderer() {
        let message = ProgressMessage::status(Some("layer"), "Extracting");
        let line = message.to_json_line().unwrap();
        assert_eq!(line.last(), Some(&b'\n'));

        let mut renderer = plain();
        renderer
            .render_line(std::str::from_utf8(&line).unwrap())
            .unwrap();
        assert_eq!(output(renderer), "layer: Extracting\n");
    }

    #[tokio::test]
    async fn render_stream_reads_until_eof() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let producer = tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            writer
                .write_all(b"{\"status\":\"one\"}\n{\"status\":\"two\"}\n")
                .await
                .unwrap();
        });

        let mut renderer = plain();
        renderer.render_stream(reader).await.unwrap();
        producer.await.unwrap();
        assert_eq!(output(renderer), "one\ntwo\n");
    }
}
