//! Format-driven argument decoding for native functions.
//!
//! Each format character consumes one actual argument and converts it into
//! the next output slot:
//!
//! | char | output | conversion |
//! |------|--------|------------|
//! | `s` | [`Arg::Str`] | ToString |
//! | `a` / `A` | [`Arg::Ascii`] | ToString, must be ASCII without NUL; `A` maps undefined to `None` |
//! | `z` / `Z` | [`Arg::Utf8`] | ToString, must not contain NUL; `Z` maps undefined to `None` |
//! | `b` | [`Arg::Bool`] | ToBoolean |
//! | `i` | [`Arg::Int32`] | ToInt32 |
//! | `u` | [`Arg::Uint32`] | ToUint32 |
//! | `h` | [`Arg::Uint16`] | ToUint16 |
//! | `n` | [`Arg::Number`] | ToNumber |
//! | `o` / `O` | [`Arg::Object`] | ToObject; `O` maps null and undefined to `None` |
//! | `p` | [`Arg::Primitive`] | ToPrimitive |
//! | `v` | [`Arg::Value`] | none |
//!
//! A space is ignored. `|` marks the rest as optional: from there on,
//! decoding stops at the last actual argument and an undefined argument
//! leaves its output untouched. `x` skips one argument and `.` throws a
//! TypeError if arguments remain.

use core_types::{ErrorKind, JsString, ObjRef, Value};

use crate::exception::JsResult;
use crate::Interpreter;

/// One output slot of [`Interpreter::parse_args`].
#[derive(Debug)]
pub enum Arg<'a> {
    /// `s`
    Str(&'a mut JsString),
    /// `a`, `A`
    Ascii(&'a mut Option<String>),
    /// `z`, `Z`
    Utf8(&'a mut Option<String>),
    /// `b`
    Bool(&'a mut bool),
    /// `i`
    Int32(&'a mut i32),
    /// `u`
    Uint32(&'a mut u32),
    /// `h`
    Uint16(&'a mut u16),
    /// `n`
    Number(&'a mut f64),
    /// `o`, `O`
    Object(&'a mut Option<ObjRef>),
    /// `p`
    Primitive(&'a mut Value),
    /// `v`
    Value(&'a mut Value),
}

impl Arg<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Str(_) => "s",
            Arg::Ascii(_) => "aA",
            Arg::Utf8(_) => "zZ",
            Arg::Bool(_) => "b",
            Arg::Int32(_) => "i",
            Arg::Uint32(_) => "u",
            Arg::Uint16(_) => "h",
            Arg::Number(_) => "n",
            Arg::Object(_) => "oO",
            Arg::Primitive(_) => "p",
            Arg::Value(_) => "v",
        }
    }
}

impl Interpreter {
    /// Decode `args` according to `format` into `outputs`.
    ///
    /// A format that does not match the outputs is a programming error and
    /// is fatal.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{JsString, Value};
    /// use interpreter::{Arg, Interpreter};
    ///
    /// let mut interp = Interpreter::new();
    /// let mut text: JsString = "".into();
    /// let mut count = -1.0;
    ///
    /// interp
    ///     .parse_args(
    ///         &[Value::from("hi")],
    ///         "s|n",
    ///         &mut [Arg::Str(&mut text), Arg::Number(&mut count)],
    ///     )
    ///     .unwrap();
    ///
    /// assert_eq!(&*text, "hi");
    /// assert_eq!(count, -1.0);
    /// ```
    pub fn parse_args(&mut self, args: &[Value], format: &str, outputs: &mut [Arg<'_>]) -> JsResult<()> {
        let mut required = true;
        let mut i = 0;
        let mut slot = 0;

        for f in format.chars() {
            if !required && i >= args.len() {
                break;
            }
            match f {
                ' ' => continue,
                '|' => {
                    required = false;
                    continue;
                }
                'x' => {
                    i += 1;
                    continue;
                }
                '.' => {
                    if i < args.len() {
                        return Err(self.throw_error(ErrorKind::TypeError, "too many arguments"));
                    }
                    continue;
                }
                _ => {}
            }

            let Some(output) = outputs.get_mut(slot) else {
                self.fatal(&format!("parse_args: no output for format '{}'", f));
            };
            if !output.kind().contains(f) {
                self.fatal(&format!(
                    "parse_args: format '{}' does not match output {:?}",
                    f,
                    output.kind()
                ));
            }
            slot += 1;

            let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
            i += 1;
            let undefined = matches!(arg, Value::Undefined);
            if undefined && !required {
                continue;
            }

            match output {
                Arg::Str(out) => **out = self.to_string(&arg)?,
                Arg::Ascii(out) => {
                    **out = if undefined && f == 'A' {
                        None
                    } else {
                        Some(self.ascii_string(&arg)?)
                    }
                }
                Arg::Utf8(out) => {
                    **out = if undefined && f == 'Z' {
                        None
                    } else {
                        Some(self.utf8_string(&arg)?)
                    }
                }
                Arg::Bool(out) => **out = self.to_boolean(&arg)?,
                Arg::Int32(out) => **out = self.to_int32(&arg)?,
                Arg::Uint32(out) => **out = self.to_uint32(&arg)?,
                Arg::Uint16(out) => **out = self.to_uint16(&arg)?,
                Arg::Number(out) => **out = self.to_number(&arg)?,
                Arg::Object(out) => {
                    **out = if f == 'O' && arg.is_nullish() {
                        None
                    } else {
                        Some(self.to_object(&arg)?)
                    }
                }
                Arg::Primitive(out) => **out = self.to_primitive(&arg, None)?,
                Arg::Value(out) => **out = arg,
            }
        }
        Ok(())
    }

    fn utf8_string(&mut self, arg: &Value) -> JsResult<String> {
        let s = self.to_string(arg)?;
        if s.contains('\0') {
            return Err(self.throw_error(ErrorKind::TypeError, "string contains NUL character"));
        }
        Ok(s.to_string())
    }

    fn ascii_string(&mut self, arg: &Value) -> JsResult<String> {
        let s = self.utf8_string(arg)?;
        if !s.is_ascii() {
            return Err(self.throw_error(ErrorKind::TypeError, "string is not ASCII"));
        }
        Ok(s)
    }
}
