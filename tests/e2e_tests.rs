//! End-to-end integration tests
//!
//! These tests drive the CLI commands and the payment engine against recorded
//! gateway responses. Each test:
//! 1. Queues response bodies from tests/fixtures/ per gateway operation
//! 2. Runs commands through a client built on a scripted transport
//! 3. Compares the CSV written to stdout, and the ledger left on disk, with
//!    what the gateway responses imply
//!
//! Fixtures cover:
//! - Approved and declined authorizations
//! - Status queries, including malformed rows and re-issued transaction ids
//! - Change-status outcomes (successful, not allowed)
//! - Batch close and report downloads

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use skipjack_gateway::cli::{execute, Command, LedgerArg};
    use skipjack_gateway::core::{GatewayClient, MemoryTransactionStore, PaymentEngine, PaymentEvent};
    use skipjack_gateway::io::ledger::read_ledger;
    use skipjack_gateway::{CurrentStatus, FormParams, GatewayConfig, GatewayError, Transport};
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::fs;
    use std::path::Path;
    use std::rc::Rc;
    use tempfile::TempDir;

    const AUTHORIZE: &str = "AuthorizeAPI";
    const STATUS: &str = "SJAPI_TransactionStatusRequest";
    const CHANGE_STATUS: &str = "SJAPI_TransactionChangeStatusRequest";
    const CLOSE_BATCH: &str = "SJAPI_TransactionCloseCurrentBatchRequest";
    const REPORT: &str = "SJAPI_ReportDownload";

    const FIRST_ID: &str = "9802853155172.022";
    const SETTLED_ID: &str = "9802853155180.022";

    /// Transport that replays fixture bodies per gateway operation
    #[derive(Default)]
    struct RecordedGateway {
        responses: RefCell<HashMap<&'static str, VecDeque<String>>>,
        requests: RefCell<Vec<(String, String)>>,
    }

    impl RecordedGateway {
        /// Queue the body of `tests/fixtures/{fixture}` for `operation`
        fn queue(&self, operation: &'static str, fixture: &str) -> &Self {
            let path = format!("tests/fixtures/{}", fixture);
            assert!(Path::new(&path).exists(), "Fixture not found: {}", path);
            let body = fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path, e));
            self.responses
                .borrow_mut()
                .entry(operation)
                .or_default()
                .push_back(body);
            self
        }

        fn requests_to(&self, operation: &str) -> Vec<String> {
            self.requests
                .borrow()
                .iter()
                .filter(|(url, _)| url.ends_with(operation))
                .map(|(_, body)| body.clone())
                .collect()
        }
    }

    impl Transport for RecordedGateway {
        fn post_form(&self, url: &str, body: &str) -> Result<String, GatewayError> {
            self.requests
                .borrow_mut()
                .push((url.to_string(), body.to_string()));

            let operation = url.rsplit('?').next().unwrap_or_default();
            let queued = self
                .responses
                .borrow_mut()
                .get_mut(operation)
                .and_then(|queue| queue.pop_front());
            queued.ok_or_else(|| GatewayError::transport(format!("no recorded response for {}", operation)))
        }
    }

    fn config() -> GatewayConfig {
        GatewayConfig::new("000111222333", "999888777666").with_report_login("111222", "merchant", "secret")
    }

    fn client(gateway: &RecordedGateway) -> GatewayClient<&RecordedGateway> {
        GatewayClient::with_transport(config(), gateway)
    }

    /// Run a command and return what it wrote to stdout
    fn run(gateway: &RecordedGateway, command: Command) -> Result<String, GatewayError> {
        let mut output = Vec::new();
        execute(command, client(gateway), &mut output)?;
        Ok(String::from_utf8(output).expect("CSV output is UTF-8"))
    }

    fn ledger(dir: &TempDir) -> LedgerArg {
        LedgerArg {
            path: dir.path().join("transactions.csv"),
        }
    }

    fn ledger_ids(path: &Path) -> Vec<String> {
        read_ledger(path)
            .expect("ledger is readable")
            .into_iter()
            .map(|record| record.transaction_id)
            .collect()
    }

    fn authorize_command(dir: &TempDir) -> Command {
        Command::Authorize {
            fields: vec![
                ("SJName".to_string(), "John Doe".to_string()),
                ("OrderNumber".to_string(), "1001".to_string()),
                ("TransactionAmount".to_string(), "100.00".to_string()),
                ("OrderString".to_string(), "SKU~Description~50.00~2~N~||".to_string()),
            ],
            ledger: ledger(dir),
        }
    }

    // Read-only commands: fixture in, CSV out
    #[rstest]
    #[case::history(
        Command::History { order_number: "1001".to_string() },
        STATUS,
        "status_mixed.csv",
        "transaction_id,order_number,amount,status,message,date,approval_code,batch_number\n\
         9802853155180.022,1001,100.00,Settled,Settled,08/06/2012 02:00:11 AM,TAS204,481\n\
         9802853155190.022,1001,-25.00,Credited,Credited,08/07/2012 10:30:00 AM,TAS204,482\n\
         9802853155195.022,1001,40.00,Deleted,Deleted,08/08/2012 09:00:00 AM,TAS210,\n"
    )]
    #[case::amount_paid(
        Command::AmountPaid { order_number: "1001".to_string() },
        STATUS,
        "status_mixed.csv",
        "amount_paid\n75.00\n"
    )]
    #[case::latest_status(
        Command::Status { order_number: "1001".to_string(), transaction_id: None },
        STATUS,
        "status_mixed.csv",
        "transaction_id,order_number,amount,status,message,date,approval_code,batch_number\n\
         9802853155195.022,1001,40.00,Deleted,Deleted,08/08/2012 09:00:00 AM,TAS210,\n"
    )]
    #[case::matched_status(
        Command::Status { order_number: "1001".to_string(), transaction_id: Some("9802853155190.022".to_string()) },
        STATUS,
        "status_mixed.csv",
        "transaction_id,order_number,amount,status,message,date,approval_code,batch_number\n\
         9802853155190.022,1001,-25.00,Credited,Credited,08/07/2012 10:30:00 AM,TAS204,482\n"
    )]
    #[case::close_batch(Command::CloseBatch, CLOSE_BATCH, "close_batch.csv", "batch_status\nBatch closed successfully\n")]
    #[case::report(
        Command::Report {
            from: chrono::NaiveDate::from_ymd_opt(2012, 8, 1).unwrap(),
            to: chrono::NaiveDate::from_ymd_opt(2012, 8, 31).unwrap(),
            filter: String::new(),
        },
        REPORT,
        "report.html",
        "OrderNumber,TransactionAmount,TransactionDate,Status\n\
         1001,1100.00,2012-08-05 15:15:00,Settled\n\
         1002,-123.45,2012-08-06 09:05:30,Credited\n"
    )]
    fn test_query_commands(
        #[case] command: Command,
        #[case] operation: &'static str,
        #[case] fixture: &str,
        #[case] expected: &str,
    ) {
        let gateway = RecordedGateway::default();
        gateway.queue(operation, fixture);

        let actual = run(&gateway, command).unwrap_or_else(|e| panic!("Command failed: {}", e));

        assert_eq!(actual, expected);
        assert_eq!(gateway.requests_to(operation).len(), 1);
    }

    #[test]
    fn test_authorize_sends_serial_numbers_first() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_approved.csv");

        let output = run(&gateway, authorize_command(&dir)).unwrap();

        assert_eq!(
            output,
            "transaction_id,order_number,amount,approved,return_code,status,avs,cvv2,cavv\n\
             9802853155172.022,1001,100.00,true,1 (Success),,Y (Address (Street) and five digit ZIP match),M (Match),CAVV not validated\n"
        );
        let body = &gateway.requests_to(AUTHORIZE)[0];
        assert!(
            body.starts_with("SerialNumber=000111222333&DeveloperSerialNumber=999888777666&SJName="),
            "unexpected field order: {}",
            body
        );
        assert_eq!(ledger_ids(&ledger(&dir).path), vec![FIRST_ID]);
    }

    #[test]
    fn test_order_number_follows_serial_numbers() {
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_approved.csv");

        client(&gateway)
            .authorize(FormParams::new().with("OrderNumber", "5"))
            .unwrap();

        assert_eq!(
            gateway.requests_to(AUTHORIZE),
            vec!["SerialNumber=000111222333&DeveloperSerialNumber=999888777666&OrderNumber=5"]
        );
    }

    #[test]
    fn test_approved_payment_fires_success_once() {
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_approved.csv");
        let mut engine = PaymentEngine::new(client(&gateway), MemoryTransactionStore::new());

        let successes = Rc::new(Cell::new(0));
        let flags = Rc::new(Cell::new(0));
        let (s, f) = (Rc::clone(&successes), Rc::clone(&flags));
        engine.subscribe(move |event| match event {
            PaymentEvent::PaymentSuccessful(_) => s.set(s.get() + 1),
            PaymentEvent::PaymentFlagged(_) => f.set(f.get() + 1),
            PaymentEvent::StatusChanged { .. } => {}
        });

        let outcome = engine.create_transaction(FormParams::new()).unwrap();

        assert!(outcome.record().is_approved());
        assert_eq!(outcome.record().avs_message, "Card authorized, exact address match with 5 digit zip code.");
        assert_eq!((successes.get(), flags.get()), (1, 0));
    }

    #[test]
    fn test_declined_payment_is_flagged_and_cannot_settle() {
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_declined.csv");
        let mut engine = PaymentEngine::new(client(&gateway), MemoryTransactionStore::new());

        let flagged = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&flagged);
        engine.subscribe(move |event| {
            if let PaymentEvent::PaymentFlagged(record) = event {
                seen.borrow_mut().push(record.return_code);
            }
        });

        let outcome = engine.create_transaction(FormParams::new()).unwrap();
        let record = outcome.record().clone();

        assert!(!record.is_approved());
        assert_eq!(record.return_code_description(), "Invalid credit card number");
        assert_eq!(record.current_status, None);
        assert_eq!(*flagged.borrow(), vec![-35]);

        let result = engine.settle(&record.transaction_id);
        assert!(matches!(result, Err(GatewayError::TransactionState { .. })));
        assert!(gateway.requests_to(CHANGE_STATUS).is_empty());
    }

    #[test]
    fn test_unknown_authorize_field_is_rejected() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_unknown_field.csv");

        let result = run(&gateway, authorize_command(&dir));

        assert!(matches!(result, Err(GatewayError::MalformedResponse { .. })));
        assert!(ledger_ids(&ledger(&dir).path).is_empty());
    }

    #[test]
    fn test_transaction_lifecycle_through_ledger() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = ledger(&dir).path;
        let gateway = RecordedGateway::default();

        // Authorize: stored with no status yet
        gateway.queue(AUTHORIZE, "authorize_approved.csv");
        run(&gateway, authorize_command(&dir)).unwrap();

        // Settling before the first status sync is refused locally
        let early = run(&gateway, Command::Settle { transaction_id: FIRST_ID.to_string(), ledger: ledger(&dir) });
        assert!(matches!(early, Err(GatewayError::TransactionState { .. })));

        // Sync picks up the authorized status
        gateway.queue(STATUS, "status_authorized.csv");
        let synced = run(&gateway, Command::Sync { ledger: ledger(&dir) }).unwrap();
        assert_eq!(synced, "checked,updated,failed\n1,1,0\n");

        // Settle, then the refresh moves the record to its new id
        gateway
            .queue(CHANGE_STATUS, "change_settle_successful.csv")
            .queue(STATUS, "status_settled.csv");
        let settled = run(&gateway, Command::Settle { transaction_id: FIRST_ID.to_string(), ledger: ledger(&dir) }).unwrap();
        assert_eq!(
            settled,
            "transaction_id,order_number,desired_status,outcome,amount,message\n\
             9802853155172.022,1001,SETTLE,SUCCESSFUL,100.00,Status change successful\n"
        );
        assert!(gateway.requests_to(CHANGE_STATUS)[0]
            .ends_with("szTransactionId=9802853155172.022&szDesiredStatus=SETTLE&szForceSettlement=1"));
        assert_eq!(ledger_ids(&path), vec![SETTLED_ID]);
        let stored = read_ledger(&path).unwrap();
        assert_eq!(stored[0].current_status, Some(CurrentStatus::Settled));

        // Settled records are no longer synced
        let idle = run(&gateway, Command::Sync { ledger: ledger(&dir) }).unwrap();
        assert_eq!(idle, "checked,updated,failed\n0,0,0\n");

        // Partial refund above the authorized amount never reaches the gateway
        let too_much = run(
            &gateway,
            Command::PartialRefund {
                transaction_id: SETTLED_ID.to_string(),
                amount: "100.01".parse().unwrap(),
                ledger: ledger(&dir),
            },
        );
        assert!(matches!(too_much, Err(GatewayError::TransactionState { .. })));
        assert_eq!(gateway.requests_to(CHANGE_STATUS).len(), 1);

        // Partial refund within the amount
        gateway
            .queue(CHANGE_STATUS, "change_credit_successful.csv")
            .queue(STATUS, "status_settled.csv");
        let refunded = run(
            &gateway,
            Command::PartialRefund {
                transaction_id: SETTLED_ID.to_string(),
                amount: "40".parse().unwrap(),
                ledger: ledger(&dir),
            },
        )
        .unwrap();
        assert!(refunded.ends_with("9802853155180.022,1001,CREDIT,SUCCESSFUL,40.00,Status change successful\n"));
        assert!(gateway.requests_to(CHANGE_STATUS)[1].contains("szAmount=40.00&szForceSettlement=1"));

        // The gateway refuses a full refund
        gateway.queue(CHANGE_STATUS, "change_credit_not_allowed.csv");
        let refused = run(&gateway, Command::Refund { transaction_id: SETTLED_ID.to_string(), ledger: ledger(&dir) });
        assert_eq!(
            refused,
            Err(GatewayError::gateway_rejection(SETTLED_ID, "CREDIT", "Transaction not settled"))
        );

        // Removing a settled record tolerates the refused delete
        gateway.queue(STATUS, "status_settled.csv");
        let removed = run(&gateway, Command::Delete { transaction_id: SETTLED_ID.to_string(), ledger: ledger(&dir) }).unwrap();
        assert_eq!(
            removed,
            "transaction_id,order_number,outcome,reason\n\
             9802853155180.022,1001,removed locally,Transaction 9802853155180.022: deletion not allowed for Settled transactions\n"
        );
        assert!(ledger_ids(&path).is_empty());
        assert_eq!(gateway.requests_to(CHANGE_STATUS).len(), 3);
    }

    #[test]
    fn test_list_reads_ledger_without_gateway() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let gateway = RecordedGateway::default();
        gateway.queue(AUTHORIZE, "authorize_declined.csv");
        run(&gateway, authorize_command(&dir)).unwrap();

        let listed = run(&gateway, Command::List { ledger: ledger(&dir) }).unwrap();

        assert_eq!(
            listed,
            "transaction_id,order_number,amount,approved,return_code,status,avs,cvv2,cavv\n\
             9802853155173.022,1002,100.00,false,-35 (Invalid credit card number),,,,CAVV not validated\n"
        );
        assert_eq!(gateway.requests.borrow().len(), 1);
    }

    #[test]
    fn test_status_without_rows_is_no_result() {
        let gateway = RecordedGateway::default();
        // A single row is only a header to the status decoder
        gateway.queue(STATUS, "close_batch.csv");

        let result = run(&gateway, Command::Status { order_number: "1001".to_string(), transaction_id: None });

        assert_eq!(result, Err(GatewayError::no_result("status")));
    }
}
