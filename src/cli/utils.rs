use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Line-oriented terminal I/O over any reader and writer
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<StdinLock<'static>, Stdout> {
    /// Console attached to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read a line of input from the terminal.
    ///
    /// Returns `UnexpectedEof` once the input is exhausted.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut input = String::new();
        if self.input.read_line(&mut input)? == 0 {
            writeln!(self.output)?;
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        // Trim whitespace and newlines
        Ok(input.trim().to_string())
    }

    /// Ask a yes/no question; anything but "yes" or "y" is a no
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        let answer = self.read_line(prompt)?.to_lowercase();
        Ok(answer == "yes" || answer == "y")
    }

    pub fn print_header(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output, "\n===== {} =====", title)
    }

    pub fn print_info(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }

    pub fn print_success(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "✅ {}", message)
    }

    pub fn print_warning(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "⚠️  {}", message)
    }

    pub fn print_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "❌ {}", message)
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}
