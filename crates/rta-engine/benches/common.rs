// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_html_content(paragraphs: usize) -> String {
    let base = "<p>Paragraph with <em>some</em> content and an <img src=\"a.gif\"> image.</p>";
    base.repeat(paragraphs)
}
