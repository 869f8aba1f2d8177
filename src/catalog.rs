//! The fixed catalog of analytical queries over the loaded tables.

use crate::error::QueryError;

/// A named, parameterless query and the columns its result must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryDefinition {
    pub name: &'static str,
    pub sql: &'static str,
    pub expected_columns: &'static [&'static str],
}

const STANDARD_QUERIES: [QueryDefinition; 10] = [
    QueryDefinition {
        name: "Demographic Distribution by Gender and Age",
        sql: r#"
            SELECT Gender,
                   date_sub('year', Birthday, current_date) AS Age,
                   COUNT(*) AS CustomerCount
            FROM Customers
            GROUP BY Gender, Age
            ORDER BY Gender, Age"#,
        expected_columns: &["Gender", "Age", "CustomerCount"],
    },
    QueryDefinition {
        name: "Demographic Distribution by Location",
        sql: r#"
            SELECT Country, State, COUNT(*) AS CustomerCount
            FROM Customers
            GROUP BY Country, State
            ORDER BY CustomerCount DESC"#,
        expected_columns: &["Country", "State", "CustomerCount"],
    },
    QueryDefinition {
        name: "Average Order Value and Purchase Frequency",
        sql: r#"
            SELECT c.CustomerKey,
                   COUNT(s."Order Number") AS PurchaseFrequency,
                   AVG(p."Unit Price USD" * s.Quantity) AS AverageOrderValue
            FROM Customers c
            JOIN Sales s ON c.CustomerKey = s.CustomerKey
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY c.CustomerKey
            ORDER BY PurchaseFrequency DESC"#,
        expected_columns: &["CustomerKey", "PurchaseFrequency", "AverageOrderValue"],
    },
    QueryDefinition {
        name: "Customer Segmentation by Demographics and Purchasing Behavior",
        sql: r#"
            SELECT c.Gender, c.Country,
                   COUNT(DISTINCT c.CustomerKey) AS CustomerCount,
                   SUM(p."Unit Price USD" * s.Quantity) AS TotalSpend
            FROM Customers c
            JOIN Sales s ON c.CustomerKey = s.CustomerKey
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY c.Gender, c.Country
            ORDER BY TotalSpend DESC"#,
        expected_columns: &["Gender", "Country", "CustomerCount", "TotalSpend"],
    },
    QueryDefinition {
        name: "Total Sales Over Time",
        sql: r#"
            SELECT CAST(s."Order Date" AS DATE) AS OrderDate,
                   SUM(p."Unit Price USD" * s.Quantity) AS TotalSales
            FROM Sales s
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY OrderDate
            ORDER BY OrderDate"#,
        expected_columns: &["OrderDate", "TotalSales"],
    },
    QueryDefinition {
        name: "Top Performing Products by Quantity Sold and Revenue",
        sql: r#"
            SELECT p."Product Name",
                   SUM(s.Quantity) AS TotalQuantitySold,
                   SUM(p."Unit Price USD" * s.Quantity) AS TotalRevenue
            FROM Sales s
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY p."Product Name"
            ORDER BY TotalRevenue DESC, TotalQuantitySold DESC
            LIMIT 10"#,
        expected_columns: &["Product Name", "TotalQuantitySold", "TotalRevenue"],
    },
    QueryDefinition {
        name: "Store Sales Performance",
        sql: r#"
            SELECT st.StoreKey, st.Country, st.State,
                   SUM(p."Unit Price USD" * s.Quantity) AS TotalRevenue
            FROM Sales s
            JOIN Stores st ON s.StoreKey = st.StoreKey
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY st.StoreKey, st.Country, st.State
            ORDER BY TotalRevenue DESC"#,
        expected_columns: &["StoreKey", "Country", "State", "TotalRevenue"],
    },
    QueryDefinition {
        name: "Sales by Currency",
        sql: r#"
            SELECT s."Currency Code",
                   SUM(p."Unit Price USD" * s.Quantity) * MAX(er.Exchange) AS TotalSales
            FROM Sales s
            JOIN Products p ON s.ProductKey = p.ProductKey
            JOIN Exchange_Rates er ON s."Currency Code" = er.Currency
            GROUP BY s."Currency Code"
            ORDER BY TotalSales DESC"#,
        expected_columns: &["Currency Code", "TotalSales"],
    },
    QueryDefinition {
        name: "Product Profitability",
        sql: r#"
            SELECT p."Product Name",
                   SUM((p."Unit Price USD" - p."Unit Cost USD") * s.Quantity) AS TotalProfit
            FROM Sales s
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY p."Product Name"
            ORDER BY TotalProfit DESC
            LIMIT 10"#,
        expected_columns: &["Product Name", "TotalProfit"],
    },
    QueryDefinition {
        name: "Sales Performance by Product Category",
        sql: r#"
            SELECT p.Category,
                   SUM(s.Quantity) AS TotalQuantitySold,
                   SUM(p."Unit Price USD" * s.Quantity) AS TotalRevenue
            FROM Sales s
            JOIN Products p ON s.ProductKey = p.ProductKey
            GROUP BY p.Category
            ORDER BY TotalRevenue DESC"#,
        expected_columns: &["Category", "TotalQuantitySold", "TotalRevenue"],
    },
];

/// Read-only name → query lookup in declaration order.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    queries: Vec<QueryDefinition>,
}

impl QueryCatalog {
    pub fn standard() -> Self {
        Self::from_definitions(STANDARD_QUERIES.to_vec())
    }

    pub fn from_definitions(queries: Vec<QueryDefinition>) -> Self {
        Self { queries }
    }

    pub fn list_names(&self) -> Vec<&'static str> {
        self.queries.iter().map(|query| query.name).collect()
    }

    pub fn get(&self, name: &str) -> Result<&QueryDefinition, QueryError> {
        self.queries
            .iter()
            .find(|query| query.name == name)
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }
}

impl Default for QueryCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
