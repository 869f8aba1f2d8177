#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use tempfile::{TempDir, tempdir};

pub const STORES_CSV: &str = "\
StoreKey,Country,State,Square Meters,Open Date
1,United States,Texas,1000,1/1/2010
2,Italy,Lazio,,3/15/2012
3,Online,Online,2000,
";

pub const PRODUCTS_CSV: &str = "\
ProductKey,Product Name,Brand,Category,Unit Cost USD,Unit Price USD
1,Widget,Contoso,Audio,$5.00,$10.00
2,Gadget,Contoso,Audio,$10.00,$20.00
3,Gizmo,Fabrikam,Computers,\"$1,000.00\",\"$1,500.00\"
4,Doohickey,Fabrikam,Computers,$2.00,$5.00
";

pub const SALES_CSV: &str = "\
Order Number,Line Item,Order Date,Delivery Date,CustomerKey,StoreKey,ProductKey,Quantity,Currency Code
1,1,1/1/2020,,100,1,1,4,USD
1,2,1/1/2020,,100,1,2,2,USD
2,1,1/2/2020,1/5/2020,200,2,3,1,EUR
3,1,1/3/2020,,300,1,4,8,USD
";

pub const EXCHANGE_RATES_CSV: &str = "\
Date,Currency,Exchange
1/1/2020,USD,1.0
1/1/2020,EUR,0.9
";

/// Written as windows-1252, so UTF-8 decoding fails on the accented name.
pub const CUSTOMERS_CSV: &str = "\
CustomerKey,Gender,Name,City,State,Country,Birthday
100,Female,José Ruiz,Austin,Texas,United States,7/3/1980
200,Male,Marco Rossi,Rome,Lazio,Italy,
300,Male,Ann Lee,Dallas,Texas,United States,12/24/1995
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        self.write_bytes(name, contents.as_bytes())
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, contents).expect("write temp file contents");
        path
    }

    /// Writes all five retail sources under the workspace root.
    pub fn write_retail_sources(&self) {
        self.write("Stores.csv", STORES_CSV);
        self.write("Products.csv", PRODUCTS_CSV);
        self.write("Sales.csv", SALES_CSV);
        self.write("Exchange_Rates.csv", EXCHANGE_RATES_CSV);
        let (latin, _, unmappable) = WINDOWS_1252.encode(CUSTOMERS_CSV);
        assert!(!unmappable, "fixture must be representable in windows-1252");
        self.write_bytes("Customers.csv", &latin);
    }

    pub fn database_path(&self) -> PathBuf {
        self.path().join("retail.duckdb")
    }
}
