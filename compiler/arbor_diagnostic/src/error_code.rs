use std::fmt;

/// Stable codes for every construction and reduction error.
///
/// Format: E#### where the second digit groups construction errors by
/// category and the first digit separates construction from reduction:
/// - E10xx: Shape errors
/// - E11xx: Type-compatibility errors
/// - E12xx: Binding-completeness errors
/// - E13xx: Uniqueness errors
/// - E14xx: Accessor errors
/// - E15xx: Structural errors
/// - E20xx: Reduction errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Shape (E10xx)
    /// Conversion lambda does not take exactly one parameter
    E1001,
    /// Lambda-like child has the wrong number of parameters
    E1002,
    /// Append operations do not match the interpolated segments
    E1003,
    /// Wrong number of arguments
    E1004,
    /// Child must be a lambda
    E1005,
    /// Parameter must be passed by reference
    E1006,
    /// Tuple arity out of range
    E1007,
    /// Array rank does not match index count
    E1008,
    /// Pattern arity does not match its input
    E1009,

    // Type compatibility (E11xx)
    /// Incompatible types
    E1101,
    /// Expression must be boolean
    E1102,
    /// Invalid switch governing type
    E1103,
    /// Test value type inconsistent with the governing type
    E1104,
    /// Null test value on a non-nullable governing type
    E1105,
    /// Void value where a value is required
    E1106,
    /// Operator not defined for the operand types
    E1107,
    /// Custom operator method signature mismatch
    E1108,
    /// Conversion lambda argument or result type mismatch
    E1109,
    /// Append alignment parameter is not `int`
    E1110,
    /// Append format parameter is not `string`
    E1111,
    /// Reference type required
    E1112,
    /// Resource is not disposable
    E1113,
    /// No enumerable pattern
    E1114,
    /// Ambiguous enumerable implementation
    E1115,
    /// Operand is not awaitable
    E1116,
    /// No conversion between types
    E1117,
    /// Expression is not a delegate
    E1118,
    /// Pattern cannot apply to the input type
    E1119,
    /// Type cannot be used as a node type
    E1120,
    /// Operation not supported by late binding
    E1121,

    // Binding completeness (E12xx)
    /// Parameter bound twice
    E1201,
    /// Required parameter not bound
    E1202,
    /// Too many arguments
    E1203,
    /// Parameter belongs to another member
    E1204,
    /// By-ref argument is not writable
    E1205,

    // Uniqueness (E13xx)
    /// Duplicate switch test value
    E1301,
    /// Duplicate variable
    E1302,
    /// Label reused
    E1303,
    /// More than one default case
    E1304,
    /// Duplicate argument name
    E1305,
    /// More than one slice in a list pattern
    E1306,

    // Accessor (E14xx)
    /// Property has no getter
    E1401,
    /// Property has no setter
    E1402,
    /// Static member accessed through an instance
    E1403,
    /// Instance member accessed without a receiver
    E1404,
    /// Enumerator lacks a required member
    E1405,
    /// Expression is not writable
    E1406,
    /// Read-only field assigned
    E1407,
    /// Member not declared on the receiver type
    E1408,

    // Structural (E15xx)
    /// Await used where forbidden
    E1501,
    /// Label type mismatch
    E1502,
    /// Continue label must be void
    E1503,
    /// Non-void block without expressions
    E1504,
    /// Identity substituted with a different type
    E1505,
    /// Slice pattern outside a list pattern
    E1506,

    // Reduction (E20xx)
    /// `goto case` reduced outside its switch
    E2001,
    /// `goto default` reduced outside its switch
    E2002,
    /// `goto case` value has no matching case
    E2003,
    /// Reduction not implemented for this shape
    E2004,
    /// Reduction did not reach a fixed point
    E2005,
    /// Reduced tree still contains non-primitive nodes
    E2006,
}

impl ErrorCode {
    /// Returns true if this code is raised while constructing nodes.
    pub fn is_construction_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E1004 => "E1004",
            ErrorCode::E1005 => "E1005",
            ErrorCode::E1006 => "E1006",
            ErrorCode::E1007 => "E1007",
            ErrorCode::E1008 => "E1008",
            ErrorCode::E1009 => "E1009",
            ErrorCode::E1101 => "E1101",
            ErrorCode::E1102 => "E1102",
            ErrorCode::E1103 => "E1103",
            ErrorCode::E1104 => "E1104",
            ErrorCode::E1105 => "E1105",
            ErrorCode::E1106 => "E1106",
            ErrorCode::E1107 => "E1107",
            ErrorCode::E1108 => "E1108",
            ErrorCode::E1109 => "E1109",
            ErrorCode::E1110 => "E1110",
            ErrorCode::E1111 => "E1111",
            ErrorCode::E1112 => "E1112",
            ErrorCode::E1113 => "E1113",
            ErrorCode::E1114 => "E1114",
            ErrorCode::E1115 => "E1115",
            ErrorCode::E1116 => "E1116",
            ErrorCode::E1117 => "E1117",
            ErrorCode::E1118 => "E1118",
            ErrorCode::E1119 => "E1119",
            ErrorCode::E1120 => "E1120",
            ErrorCode::E1121 => "E1121",
            ErrorCode::E1201 => "E1201",
            ErrorCode::E1202 => "E1202",
            ErrorCode::E1203 => "E1203",
            ErrorCode::E1204 => "E1204",
            ErrorCode::E1205 => "E1205",
            ErrorCode::E1301 => "E1301",
            ErrorCode::E1302 => "E1302",
            ErrorCode::E1303 => "E1303",
            ErrorCode::E1304 => "E1304",
            ErrorCode::E1305 => "E1305",
            ErrorCode::E1306 => "E1306",
            ErrorCode::E1401 => "E1401",
            ErrorCode::E1402 => "E1402",
            ErrorCode::E1403 => "E1403",
            ErrorCode::E1404 => "E1404",
            ErrorCode::E1405 => "E1405",
            ErrorCode::E1406 => "E1406",
            ErrorCode::E1407 => "E1407",
            ErrorCode::E1408 => "E1408",
            ErrorCode::E1501 => "E1501",
            ErrorCode::E1502 => "E1502",
            ErrorCode::E1503 => "E1503",
            ErrorCode::E1504 => "E1504",
            ErrorCode::E1505 => "E1505",
            ErrorCode::E1506 => "E1506",
            ErrorCode::E2001 => "E2001",
            ErrorCode::E2002 => "E2002",
            ErrorCode::E2003 => "E2003",
            ErrorCode::E2004 => "E2004",
            ErrorCode::E2005 => "E2005",
            ErrorCode::E2006 => "E2006",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
