//! Type conversions.
//!
//! Every conversion that may have to consult an object goes through
//! [`Interpreter::to_primitive`], which runs the object's default-value
//! operation and so may call script code and throw.

use core_types::{ErrorKind, JsString, ObjRef, Value};

use crate::config::JsCompat;
use crate::exception::JsResult;
use crate::intrinsics::PrimitiveWrapper;
use crate::object::Hint;
use crate::Interpreter;

impl Interpreter {
    /// ToPrimitive: primitives pass through, objects use their default value.
    pub fn to_primitive(&mut self, value: &Value, hint: Option<Hint>) -> JsResult<Value> {
        match value {
            Value::Object(obj) => self.default_value(*obj, hint),
            Value::Reference(_) | Value::Completion(_) => {
                self.fatal("internal value reached a type conversion")
            }
            _ => Ok(value.clone()),
        }
    }

    /// ToBoolean.
    ///
    /// Under JavaScript 1.2 and earlier a Boolean wrapper object converts
    /// through its `valueOf` method.
    pub fn to_boolean(&mut self, value: &Value) -> JsResult<bool> {
        if let Value::Object(obj) = value {
            if self.compat().js_at_most(JsCompat::Js12) && self.is_boolean_wrapper(*obj) {
                let value_of = self.names().value_of.clone();
                let f = self.get(*obj, &value_of)?;
                if let Value::Object(f) = f {
                    if self.is_callable(&Value::Object(f)) {
                        if let Value::Boolean(b) = self.call(f, Some(*obj), &[])? {
                            return Ok(b);
                        }
                    }
                }
            }
        }
        Ok(value.is_truthy())
    }

    /// ToNumber.
    pub fn to_number(&mut self, value: &Value) -> JsResult<f64> {
        Ok(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(n) => *n,
            Value::String(s) => core_types::string_to_number(s),
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Some(Hint::Number))?;
                return self.to_number(&primitive);
            }
            Value::Reference(_) | Value::Completion(_) => {
                self.fatal("internal value reached a type conversion")
            }
        })
    }

    /// ToInteger.
    pub fn to_integer(&mut self, value: &Value) -> JsResult<f64> {
        Ok(core_types::to_integer(self.to_number(value)?))
    }

    /// ToInt32.
    pub fn to_int32(&mut self, value: &Value) -> JsResult<i32> {
        Ok(core_types::to_int32(self.to_number(value)?))
    }

    /// ToUint32.
    pub fn to_uint32(&mut self, value: &Value) -> JsResult<u32> {
        Ok(core_types::to_uint32(self.to_number(value)?))
    }

    /// ToUint16.
    pub fn to_uint16(&mut self, value: &Value) -> JsResult<u16> {
        Ok(core_types::to_uint16(self.to_number(value)?))
    }

    /// ToString.
    pub fn to_string(&mut self, value: &Value) -> JsResult<JsString> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Some(Hint::String))?;
                self.to_string(&primitive)
            }
            Value::Reference(_) | Value::Completion(_) => {
                self.fatal("internal value reached a type conversion")
            }
            _ => Ok(JsString::from(value.to_string())),
        }
    }

    /// ToObject: wraps primitives, rejects undefined and null.
    pub fn to_object(&mut self, value: &Value) -> JsResult<ObjRef> {
        let (class, proto) = match value {
            Value::Object(obj) => return Ok(*obj),
            Value::Undefined | Value::Null => {
                let message = format!("cannot convert {} to object", value);
                return Err(self.throw_error(ErrorKind::TypeError, &message));
            }
            Value::Boolean(_) => ("Boolean", self.intrinsics().boolean_prototype),
            Value::Number(_) => ("Number", self.intrinsics().number_prototype),
            Value::String(_) => ("String", self.intrinsics().string_prototype),
            Value::Reference(_) | Value::Completion(_) => {
                self.fatal("internal value reached a type conversion")
            }
        };
        Ok(self.wrap_primitive(class, value.clone(), proto))
    }

    /// `typeof`, distinguishing callable objects.
    pub fn type_of(&self, value: &Value) -> &'static str {
        if self.is_callable(value) {
            "function"
        } else {
            value.type_of()
        }
    }

    fn is_boolean_wrapper(&self, obj: ObjRef) -> bool {
        self.heap.get(obj).map_or(false, |o| {
            o.as_any()
                .downcast_ref::<PrimitiveWrapper>()
                .map_or(false, |w| matches!(w.value(), Value::Boolean(_)))
        })
    }
}
