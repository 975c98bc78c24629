use indoc::indoc;
use nstm_emulator::{
    load, parse,
    runtime::{Computer, FaultKind, StdConsole, State},
};
use pretty_assertions::assert_eq;

/// Parse, load and run a listing with the given input, returning the computer and the output
fn run(listing: &str, input: &str) -> (Computer, String) {
    let program = parse(listing).unwrap();
    let mut computer = load(program).unwrap();
    let mut console = StdConsole::new(input.as_bytes(), Vec::new());
    // Faults are checked through the computer state
    let _ = computer.run(&mut console);
    let output = String::from_utf8(console.into_output()).unwrap();
    (computer, output)
}

#[test]
fn add_and_print() {
    let (computer, output) = run(
        indoc! {"
            LDIi 0, 3
            LDIi 1, 4
            ADDi 2, 0, 1
            CALL 4, 2
            HALT
        "},
        "",
    );

    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "7\n");
    assert_eq!(computer.cycles, 5);
}

const ECHO_UNTIL_ZERO: &str = indoc! {"
    ; Echo integers until a zero is read
        LDIi 1, 0       ; 0
        CALL 0, 0       ; 1: read an integer
        EQUi 2, 0, 1    ; 2
        BOTb 2, 3       ; 3: to the HALT at 6
        CALL 4, 0       ; 4
        JUMP 1          ; 5
        HALT            ; 6
"};

#[test]
fn echo_until_zero() {
    let (computer, output) = run(ECHO_UNTIL_ZERO, "3 5\n0\n");
    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "3\n5\n");
    assert_eq!(computer.registers.pc, 6);
    assert_eq!(computer.cycles, 15);

    let (computer, output) = run(ECHO_UNTIL_ZERO, "0");
    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "");
    assert_eq!(computer.cycles, 5);
}

#[test]
fn echo_until_end_of_input() {
    let (computer, output) = run(ECHO_UNTIL_ZERO, "-4");
    assert_eq!(output, "-4\n");

    let fault = computer.fault().unwrap();
    assert_eq!(
        fault.kind,
        FaultKind::IoParseError {
            expected: "an integer",
            token: None,
        }
    );
    assert_eq!(fault.pc, 1);
}

#[test]
fn division_by_zero() {
    let (computer, output) = run(
        indoc! {"
            LDIi 1, 10
            DIVi 0, 1, 2
            CALL 4, 0
            HALT
        "},
        "",
    );

    assert_eq!(output, "");
    assert!(matches!(computer.state(), State::Faulted(_)));
    let fault = computer.fault().unwrap();
    assert_eq!(fault.kind, FaultKind::DivisionByZero);
    insta::assert_snapshot!(fault, @r#"division by zero at 1 ("DIVi 0, 1, 2")"#);
    assert_eq!(computer.registers.pc, 1);
}

const GREETER: &str = indoc! {r#"
        SSTR "admin"            ; 0
        SSTR "Welcome back"     ; 1
        SSTR "Hello"            ; 2
        CALL 3, 5               ; 3: read a name in slot 5
        EQUs 0, 5, 0            ; 4
        BOFb 0, 3               ; 5: to 8
        CALL 7, 1               ; 6
        HALT                    ; 7
        CALL 7, 2               ; 8
        CALL 7, 5               ; 9
        HALT                    ; 10
"#};

#[test]
fn greeter() {
    let (computer, output) = run(GREETER, "admin\n");
    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "Welcome back\n");

    let (computer, output) = run(GREETER, "  bob  ");
    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "Hello\nbob\n");
    assert_eq!(computer.strings.get(5), Ok("bob"));
    assert_eq!(computer.strings.get(3), Ok(""));
}

#[test]
fn type_punning() {
    let (computer, output) = run(
        indoc! {"
            .data 0, 2.5
                LDWi 0, 0
                CALL 4, 0
                LDWf 3, 0
                CALL 5, 3
                LDIf 1, -1.0
                STWf 1, 1
                LDWi 2, 1
                CALL 4, 2
                HALT
        "},
        "",
    );

    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(output, "1075838976\n2.5\n-1082130432\n");
    assert_eq!(computer.memory.load_word(1), Ok(0xBF80_0000));
}

#[test]
fn booleans() {
    let (computer, output) = run(
        indoc! {"
            CALL 2, 0
            CALL 2, 1
            LTHf 2, 0, 0
            CALL 6, 0
            CALL 6, 1
            CALL 6, 2
            CALL 2, 3
        "},
        "TRUE 0\nmaybe",
    );

    assert_eq!(output, "true\nfalse\nfalse\n");
    assert_eq!(
        computer.fault().map(|f| &f.kind),
        Some(&FaultKind::IoParseError {
            expected: "a boolean",
            token: Some("maybe".to_owned()),
        })
    );
}

#[test]
fn runs_off_the_end_of_memory() {
    let (computer, _) = run("JUMP 1023\n", "");
    // Every other cell holds a HALT
    assert_eq!(computer.state(), &State::Halted);
    assert_eq!(computer.registers.pc, 1023);
    assert_eq!(computer.cycles, 2);

    let (computer, _) = run("JUMP 2000\n", "");
    let fault = computer.fault().unwrap();
    assert_eq!(fault.kind, FaultKind::InstructionAddressOutOfRange(2000));
    assert_eq!(fault.instruction, None);
}
