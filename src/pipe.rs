use crate::value::{Map, Value};
use std::fmt::{Arguments, Display, Formatter, Result, Write};

/// Wraps some underlying buffer by providing methods that write to it
/// in different formats.
pub struct Pipe<'buffer> {
    buffer: &'buffer mut (dyn Write + 'buffer),
}

impl<'buffer> Pipe<'buffer> {
    /// Create a new Pipe that writes to the given buffer.
    pub fn new(buffer: &'buffer mut String) -> Self {
        Self { buffer }
    }

    /// Create a new Pipe that writes to any [`Write`] implementation.
    fn from_writer(buffer: &'buffer mut (dyn Write + 'buffer)) -> Self {
        Self { buffer }
    }

    /// Write the given Value to the Pipe buffer.
    ///
    /// When `escape` is true, the text is HTML escaped before it is written.
    ///
    /// # Errors
    ///
    /// The Pipe supports all Value types, so the only error that will
    /// be returned is propagated from the [write!] macro itself.
    pub fn write_value(&mut self, value: &Value, escape: bool) -> Result {
        if let Value::String(string) = value {
            return self.write_text(string, escape);
        }

        let mut text = String::new();
        Pipe::new(&mut text).write_plain(value)?;
        self.write_text(&text, escape)
    }

    /// Write the text, escaping it when asked to.
    fn write_text(&mut self, text: &str, escape: bool) -> Result {
        if escape {
            write_escaped(&mut *self.buffer, text)
        } else {
            self.buffer.write_str(text)
        }
    }

    /// Write the value without escaping.
    fn write_plain(&mut self, value: &Value) -> Result {
        match value {
            Value::Null => Ok(()),
            Value::String(string) => self.buffer.write_str(string),
            Value::Array(array) => self.write_array(array),
            Value::Map(map) => self.write_map(map),
            Value::Object(object) => match object.to_text() {
                Some(text) => self.buffer.write_str(&text),
                None => self.buffer.write_str("[object]"),
            },
            Value::Bool(bool) => self.write_display(bool),
            Value::Number(number) => self.write_display(number),
        }
    }

    /// Write the value to the buffer using the Display implementation.
    fn write_display(&mut self, value: impl Display) -> Result {
        write!(self.buffer, "{}", value)
    }

    /// Write the value to the buffer as a comma separated list and
    /// surrounded by brackets.
    fn write_array(&mut self, value: &[Value]) -> Result {
        write!(self.buffer, "[")?;
        let mut iter = value.iter();
        if let Some(item) = iter.next() {
            self.write_plain(item)?;
            for item in iter {
                write!(self.buffer, ", ")?;
                self.write_plain(item)?;
            }
        }
        write!(self.buffer, "]")
    }

    /// Write the value to the buffer as key/value pairs and surrounded
    /// by curly braces.
    fn write_map(&mut self, value: &Map) -> Result {
        write!(self.buffer, "{{")?;
        let mut iter = value.iter();
        if let Some((key, value)) = iter.next() {
            write!(self.buffer, "{}: ", key)?;
            self.write_plain(value)?;
            for (key, value) in iter {
                write!(self.buffer, ", {}: ", key)?;
                self.write_plain(value)?;
            }
        }
        write!(self.buffer, "}}")
    }
}

impl Write for Pipe<'_> {
    #[inline]
    fn write_str(&mut self, s: &str) -> Result {
        Write::write_str(self.buffer, s)
    }

    #[inline]
    fn write_char(&mut self, c: char) -> Result {
        Write::write_char(self.buffer, c)
    }

    #[inline]
    fn write_fmt(&mut self, args: Arguments<'_>) -> Result {
        Write::write_fmt(self.buffer, args)
    }
}

/// Return the text form of a [`Value`], as it would be written to output.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(string) => string.clone(),
        _ => value.to_string(),
    }
}

impl Display for Value {
    /// Format the value as it is written to output, without escaping.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        Pipe::from_writer(f).write_plain(self)
    }
}

/// Write the text with HTML special characters replaced by entities.
fn write_escaped<W>(buffer: &mut W, text: &str) -> Result
where
    W: Write + ?Sized,
{
    let mut last = 0;
    for (index, char) in text.char_indices() {
        let entity = match char {
            '&' => "&amp;",
            '<' => "&lt;",
            '>' => "&gt;",
            '"' => "&quot;",
            '\'' => "&#39;",
            _ => continue,
        };
        buffer.write_str(&text[last..index])?;
        buffer.write_str(entity)?;
        last = index + 1;
    }
    buffer.write_str(&text[last..])
}
