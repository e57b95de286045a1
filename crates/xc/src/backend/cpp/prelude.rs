//! C++ runtime prelude
//!
//! Emitted declarations are spliced in at [`BODY_MARKER`]. The entry point
//! at the bottom calls [`ENTRY_SYMBOL`], which the program must define.

pub const BODY_MARKER: &str = "{{BODY}}";
pub const ENTRY_SYMBOL: &str = "_main";

pub const PRELUDE: &str = r#"#pragma region X_STANDARD_IMPORTS
#include <any>
#include <cstddef>
#include <cstdint>
#include <cstdlib>
#include <functional>
#include <initializer_list>
#include <iostream>
#include <locale.h>
#include <new>
#include <string>
#include <type_traits>
#include <vector>
#pragma endregion X_STANDARD_IMPORTS

#pragma region X_BUILTIN_VALUES
#define nil nullptr
#pragma endregion X_BUILTIN_VALUES

#pragma region X_BUILTIN_TYPES
typedef int8_t i8;
typedef int16_t i16;
typedef int32_t i32;
typedef int64_t i64;
typedef uint8_t u8;
typedef uint16_t u16;
typedef uint32_t u32;
typedef uint64_t u64;
typedef std::make_signed<std::size_t>::type ssize;
typedef std::size_t size;
typedef float f32;
typedef double f64;
typedef wchar_t rune;
typedef std::any any;
typedef std::nullptr_t nil_t;
typedef void* voidptr;
typedef intptr_t intptr;
typedef uintptr_t uintptr;
#pragma endregion X_BUILTIN_TYPES

#pragma region X_RUNTIME
struct x_fault {
  std::basic_string<rune> message;

  explicit x_fault(const std::basic_string<rune> &message): message(message) {}
};

#define XTHROW(MESSAGE) throw x_fault(MESSAGE)
#define XALLOC new(std::nothrow)

struct __xdefer {
  std::function<void(void)> fn;

  explicit __xdefer(const std::function<void(void)> &fn): fn(fn) {}
  ~__xdefer() { this->fn(); }
};

inline void x_check_index(const ssize index, const ssize length) {
  if (index < 0 || index >= length) {
    XTHROW(L"index out of range: " + std::to_wstring(index) + L" of " +
           std::to_wstring(length));
  }
}
#pragma endregion X_RUNTIME

#pragma region X_STRUCTURES
class str {
public:
  std::basic_string<rune> buffer;

  str(void) {}
  str(const std::basic_string<rune> &buffer): buffer(buffer) {}
  str(const rune *buffer): buffer(buffer) {}

  ssize len(void) const noexcept { return static_cast<ssize>(this->buffer.length()); }

  bool operator==(const str &other) const noexcept { return this->buffer == other.buffer; }
  bool operator!=(const str &other) const noexcept { return this->buffer != other.buffer; }
  bool operator<(const str &other) const noexcept { return this->buffer < other.buffer; }
  bool operator<=(const str &other) const noexcept { return this->buffer <= other.buffer; }
  bool operator>(const str &other) const noexcept { return this->buffer > other.buffer; }
  bool operator>=(const str &other) const noexcept { return this->buffer >= other.buffer; }

  str operator+(const str &other) const { return str(this->buffer + other.buffer); }

  str &operator+=(const str &other) {
    this->buffer += other.buffer;
    return *this;
  }

  rune &operator[](const ssize index) {
    x_check_index(index, this->len());
    return this->buffer[index];
  }

  friend std::wostream &operator<<(std::wostream &stream, const str &s) {
    stream << s.buffer;
    return stream;
  }
};

template <typename T>
class array {
public:
  std::vector<T> buffer;

  array(void) {}
  array(std::nullptr_t) {}
  array(std::initializer_list<T> items): buffer(items) {}

  ssize len(void) const noexcept { return static_cast<ssize>(this->buffer.size()); }

  typename std::vector<T>::iterator begin(void) noexcept { return this->buffer.begin(); }
  typename std::vector<T>::iterator end(void) noexcept { return this->buffer.end(); }
  typename std::vector<T>::const_iterator begin(void) const noexcept { return this->buffer.begin(); }
  typename std::vector<T>::const_iterator end(void) const noexcept { return this->buffer.end(); }

  bool operator==(const array<T> &other) const { return this->buffer == other.buffer; }
  bool operator!=(const array<T> &other) const { return !(*this == other); }
  bool operator==(std::nullptr_t) const noexcept { return this->buffer.empty(); }
  bool operator!=(std::nullptr_t) const noexcept { return !this->buffer.empty(); }

  T &operator[](const ssize index) {
    x_check_index(index, this->len());
    return this->buffer[index];
  }

  friend std::wostream &operator<<(std::wostream &stream, const array<T> &a) {
    stream << L"[";
    for (ssize index = 0; index < a.len(); ++index) {
      if (index > 0) {
        stream << L", ";
      }
      stream << a.buffer[index];
    }
    stream << L"]";
    return stream;
  }
};
#pragma endregion X_STRUCTURES

#pragma region X_BUILTIN_FUNCTIONS
template <typename T>
inline void _out(const T &value) { std::wcout << value; }
inline void _out(const bool value) { std::wcout << (value ? L"true" : L"false"); }
inline void _out(const i8 value) { std::wcout << static_cast<i32>(value); }
inline void _out(const u8 value) { std::wcout << static_cast<u32>(value); }

inline void _outln(void) { std::wcout << std::endl; }

template <typename T>
inline void _outln(const T &value) {
  _out(value);
  std::wcout << std::endl;
}

inline ssize _len(const str &s) noexcept { return s.len(); }

template <typename T>
inline ssize _len(const array<T> &a) noexcept { return a.len(); }

inline void _panic(const str &message) { XTHROW(message.buffer); }
#pragma endregion X_BUILTIN_FUNCTIONS

#pragma region TRANSPILED_X_CODE
{{BODY}}
#pragma endregion TRANSPILED_X_CODE

#pragma region X_ENTRY_POINT
int main(void) {
  setlocale(0x0, "");
  try {
    _main();
  } catch (const x_fault &fault) {
    std::wcerr << L"panic: " << fault.message << std::endl;
    return EXIT_FAILURE;
  }
  return EXIT_SUCCESS;
}
#pragma endregion X_ENTRY_POINT
"#;

/// Wrap emitted declarations in the prelude
pub fn wrap(body: &str) -> String {
    PRELUDE.replacen(BODY_MARKER, body, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sema::Builtin;
    use crate::types::TypeTag;

    #[test]
    fn test_every_primitive_is_defined() {
        for tag in TypeTag::ALL {
            let Ok(name) = tag.cpp_name() else {
                continue;
            };
            if matches!(tag, TypeTag::Void | TypeTag::Bool) {
                continue;
            }
            let typedef = format!(" {};", name);
            let class = format!("class {} {{", name);
            assert!(
                PRELUDE.contains(&typedef) || PRELUDE.contains(&class),
                "prelude does not define '{}'",
                name
            );
        }
    }

    #[test]
    fn test_single_body_marker() {
        assert_eq!(PRELUDE.matches(BODY_MARKER).count(), 1);
        let text = wrap("void _main() {}");
        assert!(!text.contains(BODY_MARKER));
        assert!(text.contains("void _main() {}\n#pragma endregion TRANSPILED_X_CODE"));
        assert!(text.contains(&format!("    {}();", ENTRY_SYMBOL)));
    }

    #[test]
    fn test_builtins_are_defined() {
        for builtin in Builtin::ALL {
            assert!(PRELUDE.contains(builtin.cpp_name()), "missing {}", builtin.cpp_name());
        }
        assert!(PRELUDE.contains("#define XTHROW("));
    }
}
