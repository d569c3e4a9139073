//! XLSX constants and default presets.

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Characters replaced in labels before they become file name components.
pub const TUP_PATH_UNSAFE: [&str; 3] = ["/", "\\", ":"];

/// Files at or above this size are read in bounded row batches.
pub const N_SIZE_STREAMING_MIN_BYTES: u64 = 50 * 1024 * 1024;
/// Default number of rows per streaming batch.
pub const N_ROWS_BATCH_DEFAULT: usize = 1_000;

/// Label used when a normalized split value is empty.
pub const C_LABEL_BLANK: &str = "(blank)";
/// Number format code of the `General` built-in format.
pub const C_NUM_FORMAT_GENERAL: &str = "General";

/// Maximum digit width (pixels) of the default Calibri 11 font.
pub const N_PX_MAX_DIGIT_WIDTH: f64 = 7.0;
/// Cell padding (pixels) added by Excel around column content.
pub const N_PX_COLUMN_PADDING: f64 = 5.0;

/// Built-in number formats that a `styles.xml` may reference by id only.
///
/// Ids 27-36 and 50-58 are locale dependent; the zh-CN codes are listed.
pub const TUP_BUILTIN_NUM_FORMATS: [(u32, &str); 55] = [
    (0, "General"),
    (1, "0"),
    (2, "0.00"),
    (3, "#,##0"),
    (4, "#,##0.00"),
    (5, "($#,##0_);($#,##0)"),
    (6, "($#,##0_);[Red]($#,##0)"),
    (7, "($#,##0.00_);($#,##0.00)"),
    (8, "($#,##0.00_);[Red]($#,##0.00)"),
    (9, "0%"),
    (10, "0.00%"),
    (11, "0.00E+00"),
    (12, "# ?/?"),
    (13, "# ??/??"),
    (14, "m/d/yy"),
    (15, "d-mmm-yy"),
    (16, "d-mmm"),
    (17, "mmm-yy"),
    (18, "h:mm AM/PM"),
    (19, "h:mm:ss AM/PM"),
    (20, "h:mm"),
    (21, "h:mm:ss"),
    (22, "m/d/yy h:mm"),
    (27, "yyyy\"年\"m\"月\""),
    (28, "m\"月\"d\"日\""),
    (29, "m\"月\"d\"日\""),
    (30, "m-d-yy"),
    (31, "yyyy\"年\"m\"月\"d\"日\""),
    (32, "h\"时\"mm\"分\""),
    (33, "h\"时\"mm\"分\"ss\"秒\""),
    (34, "上午/下午h\"时\"mm\"分\""),
    (35, "上午/下午h\"时\"mm\"分\"ss\"秒\""),
    (36, "yyyy\"年\"m\"月\""),
    (37, "(#,##0_);(#,##0)"),
    (38, "(#,##0_);[Red](#,##0)"),
    (39, "(#,##0.00_);(#,##0.00)"),
    (40, "(#,##0.00_);[Red](#,##0.00)"),
    (41, r#"_(* #,##0_);_(* \(#,##0\);_(* "-"_);_(@_)"#),
    (42, r#"_("$"* #,##0_);_("$"* \(#,##0\);_("$"* "-"_);_(@_)"#),
    (43, r#"_(* #,##0.00_);_(* \(#,##0.00\);_(* "-"??_);_(@_)"#),
    (44, r#"_("$"* #,##0.00_);_("$"* \(#,##0.00\);_("$"* "-"??_);_(@_)"#),
    (45, "mm:ss"),
    (46, "[h]:mm:ss"),
    (47, "mmss.0"),
    (48, "##0.0E+0"),
    (49, "@"),
    (50, "yyyy\"年\"m\"月\""),
    (51, "m\"月\"d\"日\""),
    (52, "yyyy\"年\"m\"月\""),
    (53, "m\"月\"d\"日\""),
    (54, "m\"月\"d\"日\""),
    (55, "上午/下午h\"时\"mm\"分\""),
    (56, "上午/下午h\"时\"mm\"分\"ss\"秒\""),
    (57, "yyyy\"年\"m\"月\""),
    (58, "m\"月\"d\"日\""),
];

/// First `numFmtId` available to workbook-defined formats.
pub const N_NUM_FORMAT_ID_CUSTOM_MIN: u32 = 164;

/// Default indexed colour palette (`indexed="0"` .. `indexed="63"`), as RGB.
pub const TUP_INDEXED_COLORS: [u32; 64] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, //
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, //
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080, //
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF, //
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF, //
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99, //
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696, //
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333, //
];

/// Tints of the six theme shades offered by the Excel colour picker.
pub const TUP_THEME_SHADE_TINTS: [f64; 6] = [0.0, 0.8, 0.6, 0.4, -0.25, -0.5];
