use aula_server::TestServer;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

struct Client {
    reader: BufReader<TcpStream>,
    stream: TcpStream,
}

impl Client {
    fn connect(addr: &str) -> Self {
        let stream = TcpStream::connect(addr).expect("failed to connect to test server");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let reader = BufReader::new(stream.try_clone().unwrap());
        Self { reader, stream }
    }

    fn send(&mut self, line: &str) {
        writeln!(self.stream, "{line}").unwrap();
        self.stream.flush().unwrap();
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read timed out");
        line.trim_end().to_owned()
    }

    /// Send a request and return its single-line response.
    fn request(&mut self, line: &str) -> String {
        self.send(line);
        self.read_line()
    }
}

fn future_date(days: u64) -> String {
    chrono::Local::now()
        .date_naive()
        .checked_add_days(chrono::Days::new(days))
        .unwrap()
        .to_string()
}

#[test]
fn reserve_approve_delivers_live_notification() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path().to_path_buf());

    let mut alice = Client::connect(&server.addr);
    assert_eq!(alice.request("CONNECT,S100"), "OK");

    let date = future_date(7);
    assert_eq!(
        alice.request(&format!("RESERVE,alice,908,{date},Mon,1,study,student,5")),
        "OK"
    );

    let mut staff = Client::connect(&server.addr);
    assert_eq!(staff.request("CONNECT,A1"), "OK");
    assert_eq!(
        staff.request(&format!("APPROVE,S100,alice,908,{date},Mon,1")),
        "OK"
    );

    // alice is connected, so the outcome arrives as a live push
    let notify = alice.read_line();
    assert!(
        notify.starts_with("NOTIFY,APPROVED,908"),
        "unexpected line: {notify}"
    );
}

#[test]
fn offline_owner_is_notified_on_reconnect() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path().to_path_buf());
    let date = future_date(7);

    {
        let mut alice = Client::connect(&server.addr);
        assert_eq!(alice.request("CONNECT,S100"), "OK");
        assert_eq!(
            alice.request(&format!("RESERVE,alice,912,{date},Tue,2,seminar,student,4")),
            "OK"
        );
        alice.send("QUIT");
    }
    // Give the server a moment to process the disconnect and unregister
    // the delivery channel.
    std::thread::sleep(Duration::from_millis(300));

    let mut staff = Client::connect(&server.addr);
    assert_eq!(staff.request("CONNECT,A1"), "OK");
    assert_eq!(
        staff.request(&format!("APPROVE,S100,alice,912,{date},Tue,2")),
        "OK"
    );

    // On reconnect the queued outcome is drained right after the ack
    let mut alice = Client::connect(&server.addr);
    assert_eq!(alice.request("CONNECT,S100"), "OK");
    let notify = alice.read_line();
    assert!(
        notify.starts_with("NOTIFY,APPROVED,912"),
        "unexpected line: {notify}"
    );

    // A second reconnect finds an empty queue: the next line is a normal
    // response, not a stale notification.
    alice.send("QUIT");
    std::thread::sleep(Duration::from_millis(100));
    let mut alice = Client::connect(&server.addr);
    assert_eq!(alice.request("CONNECT,S100"), "OK");
    assert_eq!(alice.request("PENDING_COUNT"), "OK:0");
}

#[test]
fn conflict_and_listing_over_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path().to_path_buf());
    let date = future_date(7);

    let mut alice = Client::connect(&server.addr);
    assert_eq!(alice.request("CONNECT,S100"), "OK");
    assert_eq!(
        alice.request(&format!("RESERVE,alice,908,{date},Mon,1,study,student,5")),
        "OK"
    );

    let mut bob = Client::connect(&server.addr);
    assert_eq!(bob.request("CONNECT,S200"), "OK");
    let resp = bob.request(&format!("RESERVE,bob,908,{date},Mon,1,study,student,3"));
    assert!(resp.starts_with("ERR:CONFLICT:"), "unexpected: {resp}");

    bob.send("LIST_PENDING");
    let first = bob.read_line();
    assert!(first.starts_with("alice,908,"));
    assert_eq!(bob.read_line(), "END");
}

#[test]
fn unknown_command_and_arity_errors() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(dir.path().to_path_buf());

    let mut client = Client::connect(&server.addr);
    assert_eq!(client.request("CONNECT,S100"), "OK");

    let resp = client.request("WHATEVER,1");
    assert!(resp.starts_with("ERR:INVALID_INPUT:unknown command"));

    let resp = client.request("RESERVE,just,three");
    assert!(resp.starts_with("ERR:INVALID_INPUT:RESERVE takes 8 fields"));

    // The connection survives errors; requests keep working
    assert_eq!(client.request("PENDING_COUNT"), "OK:0");
}
