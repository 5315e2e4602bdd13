use super::flags::{write_defaults, write_gates};
use crate::{
    backend::{
        byte_array, c_str, sink_name, write_check_support, write_includes, write_progress,
        write_sink, RUNTIME_INCLUDES,
    },
    config::OracleConfig,
    fixture::Fixture,
};
use std::fmt::Write;

/// How a companion sink reaches the compiler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flavor {
    /// Appended by the translator to its own output, which already declares
    /// the runtime value API.
    Spliced,
    /// Compiled as a separate translation unit next to the generated source.
    Standalone,
}

const COMPANION_INCLUDES: &[&str] = &[
    "core/rt/value.h",
    "core/rt/au_string.h",
    "core/rt/au_array.h",
    "core/rt/au_tuple.h",
];

const DRIVER_INCLUDES: &[&str] = &["os/tmpfile.h", "os/spawn.h", "os/cc.h", "compiler/c_comp.h"];

/// The sink for one fixture, overriding the runtime's `__au_value_print`.
pub fn companion_unit(index: usize, fixture: &Fixture, flavor: Flavor) -> String {
    let mut out = String::new();
    match flavor {
        Flavor::Spliced => write_includes(&mut out, &[]),
        Flavor::Standalone => write_includes(&mut out, COMPANION_INCLUDES),
    }
    write_check_support(&mut out);
    write_sink(&mut out, index, fixture);
    let _ = writeln!(
        out,
        "void __au_value_print(au_value_t value) {{\n    {}(value);\n}}",
        sink_name(index)
    );
    out
}

/// Renders `tests_comp.c`: one runner per fixture behind a selector `main`.
pub fn generate_suite(fixtures: &[Fixture], config: &OracleConfig) -> String {
    let mut out = String::from("/* Generated by fixture-oracle. Do not edit. */\n\n");
    write_defaults(&mut out, &config.features);
    let includes: Vec<&str> = RUNTIME_INCLUDES
        .iter()
        .chain(DRIVER_INCLUDES)
        .copied()
        .collect();
    write_includes(&mut out, &includes);
    out.push_str("extern char *TEST_RT_CODE;\nextern size_t TEST_RT_CODE_LEN;\n\n");
    write_setup(&mut out, config);
    out.push_str(RUN_COMPILED);
    for (index, fixture) in fixtures.iter().enumerate() {
        write_runner(&mut out, index, fixture);
    }
    write_main(&mut out, fixtures);
    out
}

fn write_setup(out: &mut String, config: &OracleConfig) {
    let archive = config.toolchain.runtime_archive.display().to_string();
    out.push_str("static struct au_cc_options cc;\n\n");
    out.push_str("static void setup(void) {\n");
    out.push_str("    au_cc_options_default(&cc);\n");
    let _ = writeln!(
        out,
        "    cc._stdlib_cache = au_data_strdup({});",
        c_str(&archive.replace('\\', "/"))
    );
    write_gates(out, "    ");
    for flag in &config.toolchain.cflags {
        let _ = writeln!(out, "    au_str_array_add(&cc.cflags, {});", c_str(flag));
    }
    for flag in &config.toolchain.ldflags {
        let _ = writeln!(out, "    au_str_array_add(&cc.ldflags, {});", c_str(flag));
    }
    out.push_str("}\n\nstatic void teardown(void) {\n    au_cc_options_del(&cc);\n}\n\n");
}

/// Translate, compile, execute. Both tmpfiles are released at `cleanup`
/// whichever step fails.
const RUN_COMPILED: &str = r#"static int run_compiled(const char *name, const char *source, size_t source_len) {
    int status = 1;
    int have_source = 0;
    int have_binary = 0;
    struct au_tmpfile c_file;
    struct au_tmpfile c_file_out;
    struct au_program program;
    struct au_c_comp_state c_state = {0};
    struct au_c_comp_options options = {0};
    struct au_str_array args = {0};

    if (!au_tmpfile_new(&c_file)) {
        fprintf(stderr, "%s: cannot create the generated source file\n", name);
        goto cleanup;
    }
    have_source = 1;
    if (!au_tmpfile_exec(&c_file_out)) {
        fprintf(stderr, "%s: cannot create the executable file\n", name);
        au_tmpfile_close(&c_file);
        goto cleanup;
    }
    have_binary = 1;

    if (au_parse(source, source_len, &program).type != AU_PARSER_RES_OK) {
        fprintf(stderr, "%s: program does not parse\n", name);
        au_tmpfile_close(&c_file);
        au_tmpfile_close(&c_file_out);
        goto cleanup;
    }
    au_c_comp(&c_state, &program, &options, 0);
    fwrite(c_state.str.data, 1, c_state.str.len, c_file.f);
    fflush(c_file.f);
    au_c_comp_state_del(&c_state);
    au_program_del(&program);
    au_tmpfile_close(&c_file);
    au_tmpfile_close(&c_file_out);

    status = au_spawn_cc(&cc, c_file_out.path, c_file.path);
    if (status != 0) {
        fprintf(stderr, "%s: compile failed with status %d\n", name, status);
        goto cleanup;
    }

    au_str_array_add(&args, c_file_out.path);
    status = au_spawn(&args);
    au_data_free(args.data);
    if (status != 0)
        fprintf(stderr, "%s: execute failed with status %d\n", name, status);

cleanup:
    if (have_binary)
        au_tmpfile_del(&c_file_out);
    if (have_source)
        au_tmpfile_del(&c_file);
    return status;
}

"#;

fn write_runner(out: &mut String, index: usize, fixture: &Fixture) {
    let companion = companion_unit(index, fixture, Flavor::Spliced);
    let _ = writeln!(out, "static int test_{index}(void) {{");
    let _ = writeln!(
        out,
        "    static unsigned char rt_code[] = {};",
        byte_array(companion.as_bytes())
    );
    let _ = writeln!(
        out,
        "    static const unsigned char source[] = {};",
        byte_array(&fixture.program)
    );
    out.push_str("    TEST_RT_CODE = (char *)rt_code;\n");
    let _ = writeln!(out, "    TEST_RT_CODE_LEN = {};", companion.len());
    let _ = writeln!(
        out,
        "    return run_compiled({}, (const char *)source, {});",
        c_str(&fixture.name),
        fixture.program.len()
    );
    out.push_str("}\n\n");
}

fn write_main(out: &mut String, fixtures: &[Fixture]) {
    let total = fixtures.len();
    out.push_str(
        r#"int main(int argc, char **argv) {
    char *end = 0;
    long sel;
    int status = 1;
    if (argc < 2) {
        fprintf(stderr, "usage: %s <selector>\n", argv[0]);
        return 2;
    }
    sel = strtol(argv[1], &end, 10);
    if (*argv[1] == '\0' || *end != '\0') {
        fprintf(stderr, "invalid selector `%s`\n", argv[1]);
        return 2;
    }
"#,
    );
    let _ = writeln!(
        out,
        "    if (sel == -1) {{\n        printf(\"%d\", {total});\n        return 0;\n    }}"
    );
    let _ = writeln!(
        out,
        "    if (sel < 0 || sel >= {total}) {{\n        \
         fprintf(stderr, \"selector %ld is outside -1..{total}\\n\", sel);\n        \
         return 2;\n    }}"
    );
    out.push_str("    setup();\n    switch (sel) {\n");
    for (index, fixture) in fixtures.iter().enumerate() {
        let _ = writeln!(out, "    case {index}:");
        write_progress(out, "        ", index, total, &fixture.name);
        let _ = writeln!(out, "        status = test_{index}();");
        out.push_str("        break;\n");
    }
    out.push_str("    }\n    teardown();\n    return status == 0 ? 0 : 1;\n}\n");
}
